use slog::Drain;
use std::error::Error;
use std::sync::Arc;
use tokio::time::Duration;
use topic_election::{
    try_create_election_node, BoxError, ElectionEvent, ElectionNodeConfig, ElectionNodeHandle, ElectionOptions,
    InMemoryGossip, LeaderJob,
};

const TOPIC: &str = "eth-usd";
const NUM_NODES: usize = 3;

/// Stands in for the on-chain submission a real oracle node would make.
struct LogSubmission {
    logger: slog::Logger,
}

#[async_trait::async_trait]
impl LeaderJob for LogSubmission {
    async fn run(&self, node: &ElectionNodeHandle) -> Result<(), BoxError> {
        let term = node.current_term().await?;
        slog::info!(self.logger, "Submitting aggregated {} price for term {}", TOPIC, term);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let root_logger = create_root_logger_for_stdout();
    let gossip = InMemoryGossip::new();

    let mut clients = Vec::with_capacity(NUM_NODES);
    for i in 0..NUM_NODES {
        let node_id = format!("node-{}", i + 1);
        let config = ElectionNodeConfig {
            network: Arc::new(gossip.network(node_id.clone())),
            topic: TOPIC.to_string(),
            logger: root_logger.clone(),
            options: ElectionOptions {
                heartbeat_interval: Some(Duration::from_millis(200)),
                submit_interval: Some(Duration::from_secs(2)),
                ..ElectionOptions::default()
            },
            leader_job: Arc::new(LogSubmission {
                logger: root_logger.new(slog::o!("NodeId" => node_id)),
            }),
            node_job: None,
            custom_message_handler: None,
        };
        clients.push(try_create_election_node(config).await?);
    }

    for client in clients.iter() {
        let logger = root_logger.new(slog::o!("NodeId" => client.node.node_id().to_string()));
        let mut listener = client.event_listener.clone();
        tokio::spawn(async move {
            while let Some(event) = listener.next_event().await {
                match event {
                    ElectionEvent::Leader { term } => slog::info!(logger, "Now leading term {}", term),
                    ElectionEvent::Follower { term, leader } => {
                        slog::info!(logger, "Following {} in term {}", leader, term)
                    }
                    other => slog::debug!(logger, "{:?}", other),
                }
            }
        });
    }

    slog::info!(root_logger, "Running {} nodes on topic {}. Ctrl-C to stop.", NUM_NODES, TOPIC);
    tokio::signal::ctrl_c().await?;

    for client in clients {
        client.shutdown();
    }
    Ok(())
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}

use chrono::Utc;
use slog::Drain;
use std::collections::HashMap;
use std::error::Error;
use std::fs::OpenOptions;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use topic_election as election;
use topic_election::{ElectionNodeHandle, InMemoryGossip, NodeId, Role};

const TOPIC: &str = "eth-usd";
const HEARTBEAT: Duration = Duration::from_millis(50);

#[tokio::test]
async fn leader_election() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let clients = create_cluster(&gossip, 5, None).await?;

    let leader_id = wait_for_single_leader(&clients, Duration::from_secs(10)).await;

    // Every follower eventually agrees on who leads.
    wait_for_followers_to_agree(&clients, &leader_id, Duration::from_secs(10)).await;

    Ok(())
}

#[tokio::test]
async fn re_election_after_leader_crash() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let mut clients = create_cluster(&gossip, 3, None).await?;

    let first_leader = wait_for_single_leader(&clients, Duration::from_secs(10)).await;
    let first_term = clients[&first_leader].node.current_term().await?;

    // Crash the leader.
    gossip.disconnect(first_leader.as_str());
    clients.remove(&first_leader).unwrap().shutdown();

    let second_leader = wait_for_single_leader(&clients, Duration::from_secs(10)).await;
    assert_ne!(first_leader, second_leader);
    assert!(clients[&second_leader].node.current_term().await? > first_term);

    Ok(())
}

#[tokio::test]
async fn late_joiner_learns_leader() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let mut clients = create_cluster(&gossip, 3, None).await?;
    let leader_id = wait_for_single_leader(&clients, Duration::from_secs(10)).await;

    let late = election::try_create_election_node(config(&gossip, "late-node", None)).await?;
    clients.insert(late.node.node_id().clone(), late);

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let state = clients[&NodeId::new("late-node")].node.current_state().await?;
        if state.leader.as_ref() == Some(&leader_id) {
            assert_eq!(state.role, Role::Follower);
            break;
        }
        assert!(Instant::now() < deadline, "Late joiner never learned the leader");
        sleep(HEARTBEAT).await;
    }

    // Joining doesn't disturb the existing leader.
    assert_eq!(wait_for_single_leader(&clients, Duration::from_secs(10)).await, leader_id);

    Ok(())
}

#[tokio::test]
async fn resigned_leader_is_replaced() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let clients = create_cluster(&gossip, 3, None).await?;
    let leader_id = wait_for_single_leader(&clients, Duration::from_secs(10)).await;
    let term = clients[&leader_id].node.current_term().await?;

    clients[&leader_id].node.resign_leader().await?;
    assert_eq!(clients[&leader_id].node.current_role().await?, Role::Follower);

    // Somebody, possibly the same node, wins a later term.
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let new_leader = wait_for_single_leader(&clients, Duration::from_secs(10)).await;
        if clients[&new_leader].node.current_term().await? > term {
            break;
        }
        assert!(Instant::now() < deadline, "No new leader after resignation");
        sleep(HEARTBEAT).await;
    }

    Ok(())
}

#[tokio::test]
async fn stopped_heartbeat_ticker_hands_over_leadership() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let clients = create_cluster(&gossip, 3, None).await?;
    let leader_id = wait_for_single_leader(&clients, Duration::from_secs(10)).await;
    let term = clients[&leader_id].node.current_term().await?;

    clients[&leader_id].node.stop_heartbeat_ticker().await?;
    assert_eq!(clients[&leader_id].node.current_role().await?, Role::Follower);

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let new_leader = wait_for_single_leader(&clients, Duration::from_secs(10)).await;
        if clients[&new_leader].node.current_term().await? > term {
            break;
        }
        assert!(Instant::now() < deadline, "No new leader after stopping heartbeats");
        sleep(HEARTBEAT).await;
    }

    Ok(())
}

#[tokio::test]
async fn only_the_leader_runs_the_leader_job() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let (runs_tx, mut runs_rx) = mpsc::unbounded_channel();
    let clients = create_cluster(&gossip, 3, Some(runs_tx)).await?;
    let leader_id = wait_for_single_leader(&clients, Duration::from_secs(10)).await;

    // Drain runs from before the election settled, then watch a few submit intervals.
    sleep(HEARTBEAT * 2).await;
    while runs_rx.try_recv().is_ok() {}
    sleep(HEARTBEAT * 20).await;

    let mut runs = 0;
    while let Ok(node_id) = runs_rx.try_recv() {
        assert_eq!(node_id, leader_id);
        runs += 1;
    }
    assert!(runs >= 1, "Leader job never ran");

    Ok(())
}

#[tokio::test]
async fn every_node_runs_the_node_job() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let (runs_tx, mut runs_rx) = mpsc::unbounded_channel();

    let mut clients = HashMap::new();
    for i in 0..3 {
        let mut node_config = config(&gossip, &node_name(i), None);
        node_config.options.job_interval = Some(HEARTBEAT * 2);
        node_config.node_job = Some(Arc::new(RecordingJob { runs: runs_tx.clone() }));
        let client = election::try_create_election_node(node_config).await?;
        clients.insert(client.node.node_id().clone(), client);
    }
    wait_for_single_leader(&clients, Duration::from_secs(10)).await;

    let mut seen = HashMap::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while seen.len() < clients.len() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let node_id = tokio::time::timeout(remaining, runs_rx.recv())
            .await?
            .expect("Job channel closed");
        *seen.entry(node_id).or_insert(0) += 1;
    }

    // Followers run it too, and it stops with the node.
    for client in clients.into_values() {
        client.shutdown();
    }
    sleep(HEARTBEAT * 2).await;
    while runs_rx.try_recv().is_ok() {}
    sleep(HEARTBEAT * 6).await;
    assert!(runs_rx.try_recv().is_err(), "Node job ran after shutdown");

    Ok(())
}

#[tokio::test]
async fn custom_messages_reach_peers() -> Result<(), Box<dyn Error>> {
    let gossip = InMemoryGossip::new();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

    let mut receiver_config = config(&gossip, "receiver", None);
    receiver_config.custom_message_handler = Some(Arc::new(RecordingHandler { seen: seen_tx }));
    let _receiver = election::try_create_election_node(receiver_config).await?;
    let sender = election::try_create_election_node(config(&gossip, "sender", None)).await?;

    sender
        .node
        .publish_custom("priceReport", serde_json::json!({ "price": 1234 }))
        .await?;

    let message = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
        .await?
        .expect("Handler channel closed");
    assert_eq!(message.message_type, "priceReport");
    assert_eq!(message.sent_from, NodeId::new("sender"));
    assert_eq!(message.data["price"], 1234);

    match sender.node.publish_custom("requestVote", serde_json::json!({})).await {
        Err(election::ElectionNodeError::ReservedMessageType(_)) => {}
        other => panic!("Unexpected result: {:?}", other),
    }

    Ok(())
}

// ------- Helpers --------

struct RecordingJob {
    runs: mpsc::UnboundedSender<NodeId>,
}

#[async_trait::async_trait]
impl election::LeaderJob for RecordingJob {
    async fn run(&self, node: &ElectionNodeHandle) -> Result<(), election::BoxError> {
        let _ = self.runs.send(node.node_id().clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl election::NodeJob for RecordingJob {
    async fn run(&self, node: &ElectionNodeHandle) -> Result<(), election::BoxError> {
        let _ = self.runs.send(node.node_id().clone());
        Ok(())
    }
}

struct RecordingHandler {
    seen: mpsc::UnboundedSender<election::CustomMessage>,
}

#[async_trait::async_trait]
impl election::CustomMessageHandler for RecordingHandler {
    async fn handle(&self, message: election::CustomMessage) -> Result<(), election::BoxError> {
        let _ = self.seen.send(message);
        Ok(())
    }
}

async fn create_cluster(
    gossip: &InMemoryGossip,
    num_members: usize,
    job_runs: Option<mpsc::UnboundedSender<NodeId>>,
) -> Result<HashMap<NodeId, election::ElectionNodeClient>, Box<dyn Error>> {
    let mut clients = HashMap::with_capacity(num_members);
    for i in 0..num_members {
        let client = election::try_create_election_node(config(gossip, &node_name(i), job_runs.clone())).await?;
        clients.insert(client.node.node_id().clone(), client);
    }

    Ok(clients)
}

fn config(
    gossip: &InMemoryGossip,
    node_id: &str,
    job_runs: Option<mpsc::UnboundedSender<NodeId>>,
) -> election::ElectionNodeConfig {
    let leader_job: Arc<dyn election::LeaderJob> = match job_runs {
        Some(runs) => Arc::new(RecordingJob { runs }),
        None => Arc::new(election::NoOpLeaderJob),
    };

    election::ElectionNodeConfig {
        network: Arc::new(gossip.network(node_id)),
        topic: TOPIC.to_string(),
        logger: create_root_logger_for_stdout(node_id.to_string()),
        options: election::ElectionOptions {
            heartbeat_interval: Some(HEARTBEAT),
            submit_interval: Some(HEARTBEAT * 4),
            ..election::ElectionOptions::default()
        },
        leader_job,
        node_job: None,
        custom_message_handler: None,
    }
}

fn node_name(id: usize) -> String {
    format!("node-{}", id + 1)
}

/// Polls until exactly one node reports itself leader of the highest term seen.
async fn wait_for_single_leader(clients: &HashMap<NodeId, election::ElectionNodeClient>, timeout: Duration) -> NodeId {
    let deadline = Instant::now() + timeout;

    loop {
        let mut leaders = Vec::new();
        for (node_id, client) in clients {
            let state = client.node.current_state().await.expect("Node exited");
            if state.role == Role::Leader {
                leaders.push((state.term, node_id.clone()));
            }
        }

        leaders.sort_by_key(|(term, _)| *term);
        if let Some((top_term, top_leader)) = leaders.last().cloned() {
            let same_term = leaders.iter().filter(|(term, _)| *term == top_term).count();
            assert_eq!(same_term, 1, "Two leaders in term {}: {:?}", top_term, leaders);
            if leaders.len() == 1 {
                return top_leader;
            }
        }

        assert!(Instant::now() < deadline, "Timeout waiting for leader election");
        sleep(HEARTBEAT).await;
    }
}

async fn wait_for_followers_to_agree(
    clients: &HashMap<NodeId, election::ElectionNodeClient>,
    leader_id: &NodeId,
    timeout: Duration,
) {
    let deadline = Instant::now() + timeout;

    'outer: loop {
        for (node_id, client) in clients {
            let state = client.node.current_state().await.expect("Node exited");
            if node_id != leader_id && state.leader.as_ref() != Some(leader_id) {
                assert!(Instant::now() < deadline, "{} never learned the leader", node_id);
                sleep(HEARTBEAT).await;
                continue 'outer;
            }
        }
        return;
    }
}

#[allow(dead_code)]
fn create_root_logger_for_file(directory_prefix: String, node_id: String) -> slog::Logger {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let log_path = format!("{}/election_log_{}/{}_info.log", directory_prefix, node_id, now);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .unwrap();

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("NodeId" => node_id))
}

fn create_root_logger_for_stdout(node_id: String) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Process" => node_id))
}

async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

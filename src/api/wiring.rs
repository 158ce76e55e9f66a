use crate::actor::{ActorClient, ElectionActor};
use crate::api::client::{ElectionNodeClient, ElectionNodeHandle};
use crate::api::options::ElectionOptionsValidated;
use crate::api::{CustomMessageHandler, ElectionEventListener, ElectionOptions, LeaderJob, NodeJob};
use crate::election::{self, ElectionNode, NodeConfig, NodeId, NodeJobTicker};
use crate::gossip::{self, GossipError, GossipNetwork};
use crate::shutdown;
use std::convert::TryFrom;
use std::sync::Arc;

pub struct ElectionNodeConfig {
    pub network: Arc<dyn GossipNetwork>,
    /// One election runs per topic.
    pub topic: String,
    pub logger: slog::Logger,
    pub options: ElectionOptions,
    pub leader_job: Arc<dyn LeaderJob>,
    /// Runs on every node every `options.job_interval`. Nothing runs when None.
    pub node_job: Option<Arc<dyn NodeJob>>,
    /// Messages of unknown type are dropped when None.
    pub custom_message_handler: Option<Arc<dyn CustomMessageHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ElectionNodeCreationError {
    #[error("Illegal options for configuring election node: {0}")]
    IllegalOptions(String),
    #[error("Gossip network returned an empty node ID")]
    EmptyNodeId,
    #[error("Failed to join topic")]
    JoinTopic(#[source] GossipError),
    #[error("Failed to subscribe to topic")]
    Subscribe(#[source] GossipError),
}

/// Joins the topic and starts an election node on it. The node starts as a follower at term 0
/// and keeps running until the returned client is shut down or dropped.
pub async fn try_create_election_node(
    config: ElectionNodeConfig,
) -> Result<ElectionNodeClient, ElectionNodeCreationError> {
    let options = ElectionOptionsValidated::try_from(config.options)
        .map_err(|e| ElectionNodeCreationError::IllegalOptions(e.to_string()))?;

    let my_id = config.network.local_id();
    if my_id.is_empty() {
        return Err(ElectionNodeCreationError::EmptyNodeId);
    }
    let my_id = NodeId::new(my_id);

    let logger = config
        .logger
        .new(slog::o!("NodeId" => my_id.to_string(), "Topic" => config.topic.clone()));

    let topic = config
        .network
        .join(&config.topic)
        .map_err(ElectionNodeCreationError::JoinTopic)?;
    let subscription = topic.subscribe().await.map_err(ElectionNodeCreationError::Subscribe)?;

    let (actor_client, actor_queue_rx) = ActorClient::new(options.inbound_queue_capacity);
    let (shutdown_handle, shutdown_signal) = shutdown::shutdown_signal();

    let (outbox, outbox_rx) = election::new_outbox(my_id.clone(), options.outbox_capacity);
    tokio::spawn(election::run_publisher(logger.clone(), topic.clone(), outbox_rx));

    let (custom_dispatcher, custom_queue) = election::new_custom_dispatcher();
    tokio::spawn(election::run_custom_message_worker(
        logger.clone(),
        config.custom_message_handler,
        custom_queue,
    ));

    let (node, election_state_change_listener) = ElectionNode::new(NodeConfig {
        logger: logger.clone(),
        my_id: my_id.clone(),
        topic,
        timing: options.timing(),
        lone_node_leadership: options.lone_node_leadership,
        leader_job: config.leader_job,
        outbox,
        custom_dispatcher,
        actor_client: actor_client.weak(),
    });

    let actor = ElectionActor::new(logger.clone(), actor_queue_rx, node);
    tokio::spawn(actor.run_event_loop(shutdown_signal.clone()));

    if let Some(node_job) = config.node_job {
        let ticker = NodeJobTicker::new(
            logger.clone(),
            my_id.clone(),
            options.job_interval,
            actor_client.weak(),
            node_job,
            shutdown_signal.clone(),
        );
        tokio::spawn(ticker.run());
    }

    tokio::spawn(gossip::run_subscription_reader(
        logger,
        subscription,
        actor_client.clone(),
        shutdown_signal,
    ));

    Ok(ElectionNodeClient {
        node: ElectionNodeHandle::new(my_id, actor_client),
        event_listener: ElectionEventListener::new(election_state_change_listener),
        shutdown_handle,
    })
}

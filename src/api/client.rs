use crate::actor::ActorClient;
use crate::api::ElectionEventListener;
use crate::election::{NodeId, Role, Term};
use crate::shutdown::NodeShutdownHandle;

/// What embedding code gets back from `try_create_election_node()`.
pub struct ElectionNodeClient {
    pub node: ElectionNodeHandle,
    pub event_listener: ElectionEventListener,
    pub(crate) shutdown_handle: NodeShutdownHandle,
}

impl ElectionNodeClient {
    /// Stops the node and leaves the topic. Dropping the client does the same.
    pub fn shutdown(self) {
        self.shutdown_handle.shutdown();
    }
}

/// ElectionNodeHandle queries and commands a running election node. Cheap to clone. Every call is
/// answered by the node's event loop, so the answer reflects a single consistent state.
#[derive(Clone)]
pub struct ElectionNodeHandle {
    node_id: NodeId,
    actor_client: ActorClient,
}

#[derive(Debug, thiserror::Error)]
pub enum ElectionNodeError {
    #[error("Election node has exited")]
    NodeExited,
    #[error("Message type '{0}' is reserved for the election protocol")]
    ReservedMessageType(String),
    #[error("Term can't be increased any further")]
    TermExhausted,
    #[error("Too many outgoing messages are waiting to be published")]
    OutboxFull,
}

/// A consistent view of the node's role, term and known leader.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElectionStatus {
    pub role: Role,
    pub term: Term,
    pub leader: Option<NodeId>,
}

impl ElectionNodeHandle {
    pub(crate) fn new(node_id: NodeId, actor_client: ActorClient) -> Self {
        ElectionNodeHandle { node_id, actor_client }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub async fn current_state(&self) -> Result<ElectionStatus, ElectionNodeError> {
        let snapshot = self.actor_client.current_state().await?;

        Ok(ElectionStatus {
            role: snapshot.role,
            term: snapshot.term,
            leader: snapshot.leader,
        })
    }

    pub async fn current_role(&self) -> Result<Role, ElectionNodeError> {
        self.current_state().await.map(|state| state.role)
    }

    pub async fn current_term(&self) -> Result<Term, ElectionNodeError> {
        self.current_state().await.map(|state| state.term)
    }

    /// Ourselves while leading, otherwise the leader last heard from in the current term.
    pub async fn current_leader(&self) -> Result<Option<NodeId>, ElectionNodeError> {
        self.current_state().await.map(|state| state.leader)
    }

    pub async fn is_leader(&self) -> Result<bool, ElectionNodeError> {
        self.current_role().await.map(|role| role == Role::Leader)
    }

    /// Other members currently subscribed to the topic.
    pub async fn subscriber_count(&self) -> Result<usize, ElectionNodeError> {
        self.actor_client.subscriber_count().await
    }

    /// Moves to the next term, forgetting the vote and leader of the current one. Returns the new
    /// term, or `TermExhausted` if the node already holds the last one.
    pub async fn increase_term(&self) -> Result<Term, ElectionNodeError> {
        self.actor_client.increase_term().await
    }

    /// Stops the leader's heartbeat and submit tickers and steps down to follower. Peers time out
    /// and elect a new leader, possibly this node again in a later term.
    pub async fn stop_heartbeat_ticker(&self) -> Result<(), ElectionNodeError> {
        self.actor_client.stop_heartbeat_ticker().await
    }

    /// Gives up leadership and becomes a follower. No-op if not leader.
    pub async fn resign_leader(&self) -> Result<(), ElectionNodeError> {
        self.actor_client.resign_leader().await
    }

    /// Publishes an application-defined message on the election topic. Peers receive it through
    /// their CustomMessageHandler.
    pub async fn publish_custom(
        &self,
        message_type: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), ElectionNodeError> {
        self.actor_client.publish_custom(message_type.into(), data).await
    }
}

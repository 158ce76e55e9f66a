use bytes::Bytes;
use std::sync::Arc;

/// GossipNetwork is this process's membership in the pub/sub network.
pub trait GossipNetwork: Send + Sync {
    /// The identity other members see in `sentFrom`. Must be unique within the network.
    fn local_id(&self) -> String;

    fn join(&self, topic: &str) -> Result<Arc<dyn GossipTopic>, GossipError>;
}

/// GossipTopic is a joined topic. Delivery is best-effort, at-least-once and unordered. A
/// publisher's own messages may be delivered back to its own subscription.
#[async_trait::async_trait]
pub trait GossipTopic: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, data: Bytes) -> Result<(), GossipError>;

    async fn subscribe(&self) -> Result<Box<dyn GossipSubscription>, GossipError>;

    /// Number of *other* members currently subscribed to this topic.
    fn subscriber_count(&self) -> usize;
}

#[async_trait::async_trait]
pub trait GossipSubscription: Send {
    /// Returns None once the subscription is closed for good.
    async fn next(&mut self) -> Option<Result<Bytes, GossipError>>;
}

#[derive(Debug, thiserror::Error)]
pub enum GossipError {
    #[error("Not a member of topic '{0}'")]
    NotJoined(String),
    #[error("Gossip network is shut down")]
    Closed,
    #[error("Transport failure: {0}")]
    Transport(String),
}

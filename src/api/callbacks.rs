use crate::api::ElectionNodeHandle;
use crate::message::CustomMessage;
use std::error::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// LeaderJob is the work the leader of a topic is responsible for, e.g. submitting aggregated
/// data on chain. It runs once right after winning an election and then once per submit interval
/// until the node stops leading. A failed run is logged and never costs the node its leadership.
#[async_trait::async_trait]
pub trait LeaderJob: Send + Sync {
    async fn run(&self, node: &ElectionNodeHandle) -> Result<(), BoxError>;
}

/// NodeJob runs on every node once per job interval, whatever its role. Fetching and reporting
/// local observations is the usual use. A failed run is logged and changes nothing else.
#[async_trait::async_trait]
pub trait NodeJob: Send + Sync {
    async fn run(&self, node: &ElectionNodeHandle) -> Result<(), BoxError>;
}

/// CustomMessageHandler receives every message whose type isn't part of the election protocol,
/// one at a time and in arrival order.
#[async_trait::async_trait]
pub trait CustomMessageHandler: Send + Sync {
    async fn handle(&self, message: CustomMessage) -> Result<(), BoxError>;
}

/// A LeaderJob that does nothing. Useful when only the election outcome matters.
pub struct NoOpLeaderJob;

#[async_trait::async_trait]
impl LeaderJob for NoOpLeaderJob {
    async fn run(&self, _node: &ElectionNodeHandle) -> Result<(), BoxError> {
        Ok(())
    }
}

//! Boundary to the peer-to-peer pub/sub transport. The election only needs to publish bytes to a
//! topic, read bytes from it, and count who else is listening.
mod api;
mod in_memory;
mod reader;

pub use api::GossipError;
pub use api::GossipNetwork;
pub use api::GossipSubscription;
pub use api::GossipTopic;
pub use in_memory::InMemoryGossip;
pub use in_memory::InMemoryNetwork;

pub(crate) use reader::run_subscription_reader;

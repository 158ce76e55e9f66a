mod actor;
mod api;
mod election;
mod gossip;
mod message;
mod shutdown;

pub use api::try_create_election_node;
pub use api::BoxError;
pub use api::CustomMessageHandler;
pub use api::ElectionEvent;
pub use api::ElectionEventListener;
pub use api::ElectionNodeClient;
pub use api::ElectionNodeConfig;
pub use api::ElectionNodeCreationError;
pub use api::ElectionNodeError;
pub use api::ElectionNodeHandle;
pub use api::ElectionOptions;
pub use api::ElectionStatus;
pub use api::LeaderJob;
pub use api::NoOpLeaderJob;
pub use api::NodeJob;
pub use election::NodeId;
pub use election::Role;
pub use election::Term;
pub use election::TermRegression;
pub use gossip::GossipError;
pub use gossip::GossipNetwork;
pub use gossip::GossipSubscription;
pub use gossip::GossipTopic;
pub use gossip::InMemoryGossip;
pub use gossip::InMemoryNetwork;
pub use message::CodecError;
pub use message::CustomMessage;
pub use message::MessageType;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. No `mod` is `pub`.

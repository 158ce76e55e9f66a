//! This mod is meant to hold most of the code for the library's client-facing API.
mod callbacks;
mod client;
mod event_bus;
mod options;
mod wiring;

pub use callbacks::BoxError;
pub use callbacks::CustomMessageHandler;
pub use callbacks::LeaderJob;
pub use callbacks::NoOpLeaderJob;
pub use callbacks::NodeJob;
pub use client::ElectionNodeClient;
pub use client::ElectionNodeError;
pub use client::ElectionNodeHandle;
pub use client::ElectionStatus;
pub use event_bus::ElectionEvent;
pub use event_bus::ElectionEventListener;
pub use options::ElectionOptions;
pub use wiring::try_create_election_node;
pub use wiring::ElectionNodeConfig;
pub use wiring::ElectionNodeCreationError;

mod custom_dispatch;
mod node;
mod outbox;
mod peers;
mod state;
mod state_change_listener;
mod term;
mod timers;
mod timing;

pub use peers::NodeId;
pub use state::Role;
pub use state::TermRegression;
pub use term::Term;

pub(crate) use custom_dispatch::new as new_custom_dispatcher;
pub(crate) use custom_dispatch::run_custom_message_worker;
pub(crate) use node::ElectionNode;
pub(crate) use node::NodeConfig;
pub(crate) use outbox::new as new_outbox;
pub(crate) use outbox::run_publisher;
pub(crate) use state::ElectionState;
pub(crate) use state_change_listener::ElectionStateChangeListener;
pub(crate) use state_change_listener::ElectionStateSnapshot;
pub(crate) use timers::ElectionTimeout;
pub(crate) use timers::LeaderHeartbeatTick;
pub(crate) use timers::NodeJobTicker;
pub(crate) use timing::TimingPolicy;


use crate::election::{NodeId, Role, Term};
use tokio::sync::watch;

/// What the outside world may observe of a node's election state at one instant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ElectionStateSnapshot {
    pub role: Role,
    pub term: Term,
    /// Self while leading.
    pub leader: Option<NodeId>,
}

pub(super) fn new(initial_state: ElectionStateSnapshot) -> (ElectionStateChangeNotifier, ElectionStateChangeListener) {
    let (snd, rcv) = watch::channel(initial_state);

    (ElectionStateChangeNotifier { snd }, ElectionStateChangeListener { rcv })
}

pub(super) struct ElectionStateChangeNotifier {
    snd: watch::Sender<ElectionStateSnapshot>,
}

impl ElectionStateChangeNotifier {
    /// Listeners only wake up when something they can see actually changed.
    pub(super) fn notify_new_state(&self, new_state: ElectionStateSnapshot) {
        self.snd.send_if_modified(|current| {
            if *current == new_state {
                return false;
            }
            *current = new_state;
            true
        });
    }
}

#[derive(Clone)]
pub(crate) struct ElectionStateChangeListener {
    rcv: watch::Receiver<ElectionStateSnapshot>,
}

impl ElectionStateChangeListener {
    /// Intermediate states are clobbered: this yields the latest state at the time of waking.
    pub(crate) async fn next(&mut self) -> Option<ElectionStateSnapshot> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }

    pub(crate) fn latest(&self) -> ElectionStateSnapshot {
        self.rcv.borrow().clone()
    }
}

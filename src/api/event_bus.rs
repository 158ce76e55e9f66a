use crate::election::{ElectionStateChangeListener, ElectionStateSnapshot, NodeId, Role, Term};

/// An election event, as observed by the local node.
///
/// Consuming these is subtle: intermediate events are not queued. If the node changes state
/// several times between two `next_event()` calls, only the most recent state is reported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ElectionEvent {
    Leader { term: Term },
    Candidate { term: Term },
    Follower { term: Term, leader: NodeId },
    FollowerNoLeader { term: Term },
}

impl ElectionEvent {
    pub fn term(&self) -> Term {
        match self {
            ElectionEvent::Leader { term }
            | ElectionEvent::Candidate { term }
            | ElectionEvent::Follower { term, .. }
            | ElectionEvent::FollowerNoLeader { term } => *term,
        }
    }
}

#[derive(Clone)]
pub struct ElectionEventListener {
    election_state_change_listener: ElectionStateChangeListener,
}

impl ElectionEventListener {
    pub(crate) fn new(election_state_change_listener: ElectionStateChangeListener) -> Self {
        ElectionEventListener {
            election_state_change_listener,
        }
    }

    /// Waits for the next change. Returns None once the node has exited.
    pub async fn next_event(&mut self) -> Option<ElectionEvent> {
        self.election_state_change_listener
            .next()
            .await
            .map(ElectionEvent::from)
    }

    /// The most recent state, without waiting.
    pub fn latest(&self) -> ElectionEvent {
        ElectionEvent::from(self.election_state_change_listener.latest())
    }
}

// ------- Conversions --------

impl From<ElectionStateSnapshot> for ElectionEvent {
    fn from(snapshot: ElectionStateSnapshot) -> Self {
        let term = snapshot.term;
        match (snapshot.role, snapshot.leader) {
            (Role::Leader, _) => ElectionEvent::Leader { term },
            (Role::Candidate, _) => ElectionEvent::Candidate { term },
            (Role::Follower, Some(leader)) => ElectionEvent::Follower { term, leader },
            (Role::Follower, None) => ElectionEvent::FollowerNoLeader { term },
        }
    }
}

use crate::election::{NodeId, Term};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Follower,
    Candidate,
    Leader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Follower => "follower",
            Role::Candidate => "candidate",
            Role::Leader => "leader",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("refusing to move term backwards from {current:?} to {attempted:?}")]
pub struct TermRegression {
    pub current: Term,
    pub attempted: Term,
}

/// ElectionState is the term/role/vote bookkeeping of one node for one topic. It is owned by the
/// node's actor, so every read and write happens on a single task and no lock is needed. It is
/// NOT responsible for deciding "when" a transition happens; ElectionNode does that.
pub(crate) struct ElectionState {
    role: Role,
    term: Term,
    voted_for: Option<NodeId>,
    leader: Option<NodeId>,
    votes_received: usize,
}

impl ElectionState {
    /// A (re)started node always begins as a follower at term 0 with no knowledge of a leader.
    pub(crate) fn new_follower() -> Self {
        ElectionState {
            role: Role::Follower,
            term: Term::default(),
            voted_for: None,
            leader: None,
            votes_received: 0,
        }
    }

    pub(crate) fn role(&self) -> Role {
        self.role
    }

    /// Moving into Candidate always starts the vote count from zero.
    pub(crate) fn set_role(&mut self, role: Role) {
        if role == Role::Candidate {
            self.votes_received = 0;
        }
        self.role = role;
    }

    pub(crate) fn term(&self) -> Term {
        self.term
    }

    /// Set current term to `new_term`. Fails if that would move the term backwards.
    ///
    /// Returns true if the term strictly increased, in which case any vote cast in the previous
    /// term is forgotten. Setting the same term again is a no-op and keeps the vote, otherwise a
    /// node could vote twice in one term.
    pub(crate) fn set_term(&mut self, new_term: Term) -> Result<bool, TermRegression> {
        if new_term < self.term {
            return Err(TermRegression {
                current: self.term,
                attempted: new_term,
            });
        }
        if new_term == self.term {
            return Ok(false);
        }

        self.term = new_term;
        self.voted_for = None;
        Ok(true)
    }

    pub(crate) fn voted_for(&self) -> Option<&NodeId> {
        self.voted_for.as_ref()
    }

    pub(crate) fn set_voted_for(&mut self, voted_for: Option<NodeId>) {
        self.voted_for = voted_for;
    }

    pub(crate) fn leader(&self) -> Option<&NodeId> {
        self.leader.as_ref()
    }

    pub(crate) fn set_leader(&mut self, leader: Option<NodeId>) {
        self.leader = leader;
    }

    pub(crate) fn votes(&self) -> usize {
        self.votes_received
    }

    pub(crate) fn set_votes(&mut self, votes: usize) {
        self.votes_received = votes;
    }
}

impl fmt::Debug for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(Term={:?}, Leader={:?}, VotedFor={:?}, Votes={})",
            self.role, self.term, self.leader, self.voted_for, self.votes_received
        )
    }
}

use crate::election::{NodeId, Term};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    #[serde(rename = "leaderID")]
    pub leader_id: NodeId,
    pub term: Term,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RequestVotePayload {
    pub term: Term,
}

/// ReplyVotePayload is published to the whole topic; `leader_id` names the candidate the reply is
/// meant for. `term` is the voter's term after handling the request. Older peers don't send it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReplyVotePayload {
    #[serde(rename = "voteGranted")]
    pub vote_granted: bool,
    #[serde(rename = "leaderID")]
    pub leader_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<Term>,
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// MessageType is the `type` tag of the envelope. The three election types are fixed, anything
/// else belongs to the application.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Heartbeat,
    RequestVote,
    ReplyVote,
    Custom(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Heartbeat => "heartbeat",
            MessageType::RequestVote => "requestVote",
            MessageType::ReplyVote => "replyVote",
            MessageType::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, MessageType::Custom(_))
    }
}

impl From<String> for MessageType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "heartbeat" => MessageType::Heartbeat,
            "requestVote" => MessageType::RequestVote,
            "replyVote" => MessageType::ReplyVote,
            _ => MessageType::Custom(name),
        }
    }
}

impl From<&str> for MessageType {
    fn from(name: &str) -> Self {
        MessageType::from(name.to_string())
    }
}

impl From<MessageType> for String {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope is exactly what goes over the wire. `data` is left as raw JSON until we know which
/// payload type to decode it into.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct Envelope {
    #[serde(rename = "type")]
    pub(super) message_type: MessageType,
    #[serde(rename = "sentFrom")]
    pub(super) sent_from: String,
    #[serde(default)]
    pub(super) data: serde_json::Value,
}

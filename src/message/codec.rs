use crate::election::NodeId;
use crate::message::envelope::Envelope;
use crate::message::{HeartbeatPayload, MessageType, ReplyVotePayload, RequestVotePayload};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Message is a fully decoded envelope.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Message {
    pub(crate) sent_from: NodeId,
    pub(crate) body: MessageBody,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MessageBody {
    Heartbeat(HeartbeatPayload),
    RequestVote(RequestVotePayload),
    ReplyVote(ReplyVotePayload),
    // The election protocol never looks inside these, it only hands them to the application.
    Custom { message_type: String, data: serde_json::Value },
}

impl MessageBody {
    pub(crate) fn message_type(&self) -> MessageType {
        match self {
            MessageBody::Heartbeat(_) => MessageType::Heartbeat,
            MessageBody::RequestVote(_) => MessageType::RequestVote,
            MessageBody::ReplyVote(_) => MessageType::ReplyVote,
            MessageBody::Custom { message_type, .. } => MessageType::Custom(message_type.clone()),
        }
    }
}

/// An application-defined message, as received from the topic.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomMessage {
    pub message_type: String,
    pub sent_from: NodeId,
    pub data: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed message envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("malformed '{message_type}' payload: {source}")]
    MalformedPayload {
        message_type: MessageType,
        source: serde_json::Error,
    },
    #[error("failed to encode '{message_type}' message: {source}")]
    Encode {
        message_type: MessageType,
        source: serde_json::Error,
    },
}

pub(crate) fn encode(message: &Message) -> Result<Bytes, CodecError> {
    let message_type = message.body.message_type();
    let data = match &message.body {
        MessageBody::Heartbeat(payload) => to_value(&message_type, payload)?,
        MessageBody::RequestVote(payload) => to_value(&message_type, payload)?,
        MessageBody::ReplyVote(payload) => to_value(&message_type, payload)?,
        MessageBody::Custom { data, .. } => data.clone(),
    };

    let envelope = Envelope {
        message_type: message_type.clone(),
        sent_from: message.sent_from.as_str().to_string(),
        data,
    };

    serde_json::to_vec(&envelope)
        .map(Bytes::from)
        .map_err(|source| CodecError::Encode { message_type, source })
}

pub(crate) fn decode(raw: &[u8]) -> Result<Message, CodecError> {
    let envelope: Envelope = serde_json::from_slice(raw).map_err(CodecError::MalformedEnvelope)?;

    let body = match envelope.message_type {
        MessageType::Heartbeat => MessageBody::Heartbeat(from_value(MessageType::Heartbeat, envelope.data)?),
        MessageType::RequestVote => MessageBody::RequestVote(from_value(MessageType::RequestVote, envelope.data)?),
        MessageType::ReplyVote => MessageBody::ReplyVote(from_value(MessageType::ReplyVote, envelope.data)?),
        MessageType::Custom(message_type) => MessageBody::Custom {
            message_type,
            data: envelope.data,
        },
    };

    Ok(Message {
        sent_from: NodeId::new(envelope.sent_from),
        body,
    })
}

fn to_value<T: Serialize>(message_type: &MessageType, payload: &T) -> Result<serde_json::Value, CodecError> {
    serde_json::to_value(payload).map_err(|source| CodecError::Encode {
        message_type: message_type.clone(),
        source,
    })
}

fn from_value<T: DeserializeOwned>(message_type: MessageType, data: serde_json::Value) -> Result<T, CodecError> {
    serde_json::from_value(data).map_err(|source| CodecError::MalformedPayload { message_type, source })
}

//! Wire format of the election protocol. Every message travels as a JSON envelope
//! `{"type", "sentFrom", "data"}` published on the topic.
mod codec;
mod envelope;
mod payload;

pub use codec::CodecError;
pub use codec::CustomMessage;
pub use envelope::MessageType;
pub use payload::HeartbeatPayload;
pub use payload::ReplyVotePayload;
pub use payload::RequestVotePayload;

pub(crate) use codec::decode;
pub(crate) use codec::encode;
pub(crate) use codec::Message;
pub(crate) use codec::MessageBody;

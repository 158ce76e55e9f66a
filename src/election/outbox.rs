use crate::election::NodeId;
use crate::gossip::GossipTopic;
use crate::message::{self, Message, MessageBody};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outbox lets the synchronous actor hand off messages without awaiting the transport. A separate
/// task drains it and publishes in order.
///
/// The queue is bounded. If the transport stalls, new messages are refused instead of piling up.
/// Losing a heartbeat or a vote reply is the same as gossip dropping it, and the next heartbeat
/// or election round sends fresh ones.
pub(crate) fn new(my_id: NodeId, capacity: usize) -> (Outbox, OutboxReceiver) {
    let (tx, rx) = mpsc::channel(capacity);

    (Outbox { my_id, sender: tx }, OutboxReceiver { receiver: rx })
}

pub(crate) struct Outbox {
    my_id: NodeId,
    sender: mpsc::Sender<Message>,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub(crate) enum OutboxError {
    #[error("outbox is full")]
    Full,
    #[error("publisher is gone")]
    Closed,
}

impl Outbox {
    pub(crate) fn send(&self, body: MessageBody) -> Result<(), OutboxError> {
        let message = Message {
            sent_from: self.my_id.clone(),
            body,
        };
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => OutboxError::Full,
            mpsc::error::TrySendError::Closed(_) => OutboxError::Closed,
        })
    }
}

pub(crate) struct OutboxReceiver {
    receiver: mpsc::Receiver<Message>,
}

impl OutboxReceiver {
    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }
}

/// Runs until every Outbox sender is dropped. Publish failures are logged and not retried; the
/// next heartbeat or election round sends fresh messages anyway.
pub(crate) async fn run_publisher(logger: slog::Logger, topic: Arc<dyn GossipTopic>, mut outbox: OutboxReceiver) {
    while let Some(outgoing) = outbox.receiver.recv().await {
        let message_type = outgoing.body.message_type();
        let raw = match message::encode(&outgoing) {
            Ok(raw) => raw,
            Err(e) => {
                slog::error!(logger, "Failed to encode outgoing message: {}", e);
                continue;
            }
        };

        if let Err(e) = topic.publish(raw).await {
            slog::warn!(logger, "Failed to publish '{}' to topic {}: {}", message_type, topic.name(), e);
        }
    }

    slog::debug!(logger, "Outbox closed, publisher exiting.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::Term;
    use crate::gossip::{GossipNetwork, InMemoryGossip};
    use crate::message::{HeartbeatPayload, RequestVotePayload};
    use std::time::Duration;

    #[tokio::test]
    async fn publisher_encodes_in_order() {
        let gossip = InMemoryGossip::new();
        let topic = gossip.network("node-1").join("prices").unwrap();
        let mut listener = gossip.network("node-2").join("prices").unwrap().subscribe().await.unwrap();

        let (outbox, receiver) = new(NodeId::new("node-1"), 10);
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let publisher = tokio::spawn(run_publisher(logger, topic, receiver));

        outbox
            .send(MessageBody::RequestVote(RequestVotePayload { term: Term::new(1) }))
            .unwrap();
        outbox
            .send(MessageBody::Heartbeat(HeartbeatPayload {
                leader_id: NodeId::new("node-1"),
                term: Term::new(1),
            }))
            .unwrap();

        let first = message::decode(&listener.next().await.unwrap().unwrap()).unwrap();
        let second = message::decode(&listener.next().await.unwrap().unwrap()).unwrap();
        assert_eq!(first.sent_from, NodeId::new("node-1"));
        assert!(matches!(first.body, MessageBody::RequestVote(_)));
        assert!(matches!(second.body, MessageBody::Heartbeat(_)));

        drop(outbox);
        tokio::time::timeout(Duration::from_secs(5), publisher)
            .await
            .expect("Unexpected timeout")
            .unwrap();
    }

    #[tokio::test]
    async fn publish_failure_is_not_fatal() {
        let gossip = InMemoryGossip::new();
        let topic = gossip.network("node-1").join("prices").unwrap();
        let mut listener = gossip.network("node-2").join("prices").unwrap().subscribe().await.unwrap();

        let (outbox, receiver) = new(NodeId::new("node-1"), 10);
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        tokio::spawn(run_publisher(logger, topic, receiver));

        gossip.disconnect("node-1");
        outbox
            .send(MessageBody::RequestVote(RequestVotePayload { term: Term::new(1) }))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        gossip.reconnect("node-1");
        outbox
            .send(MessageBody::RequestVote(RequestVotePayload { term: Term::new(2) }))
            .unwrap();

        let delivered = message::decode(&listener.next().await.unwrap().unwrap()).unwrap();
        assert_eq!(
            delivered.body,
            MessageBody::RequestVote(RequestVotePayload { term: Term::new(2) })
        );
    }

    #[test]
    fn full_outbox_refuses_instead_of_growing() {
        let (outbox, mut receiver) = new(NodeId::new("node-1"), 2);
        let vote = |term| MessageBody::RequestVote(RequestVotePayload { term: Term::new(term) });

        assert_eq!(outbox.send(vote(1)), Ok(()));
        assert_eq!(outbox.send(vote(2)), Ok(()));
        assert_eq!(outbox.send(vote(3)), Err(OutboxError::Full));

        // Queued messages are untouched and room frees up as the publisher drains.
        assert_eq!(receiver.try_recv().unwrap().body, vote(1));
        assert_eq!(outbox.send(vote(4)), Ok(()));
        assert_eq!(receiver.try_recv().unwrap().body, vote(2));
        assert_eq!(receiver.try_recv().unwrap().body, vote(4));

        drop(receiver);
        assert_eq!(outbox.send(vote(5)), Err(OutboxError::Closed));
    }
}

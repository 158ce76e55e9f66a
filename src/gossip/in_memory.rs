use crate::gossip::{GossipError, GossipNetwork, GossipSubscription, GossipTopic};
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// InMemoryGossip is a process-local pub/sub hub. Every member gets its own `InMemoryNetwork`,
/// and every publish is fanned out to all subscriptions on the topic, the publisher's included.
/// Used to run several election nodes inside one process (tests, demo).
#[derive(Clone, Default)]
pub struct InMemoryGossip {
    hub: Arc<Mutex<Hub>>,
}

#[derive(Default)]
struct Hub {
    topics: HashMap<String, Vec<Subscriber>>,
    disconnected: HashSet<String>,
}

struct Subscriber {
    node_id: String,
    sender: mpsc::UnboundedSender<Bytes>,
}

impl InMemoryGossip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(&self, node_id: impl Into<String>) -> InMemoryNetwork {
        InMemoryNetwork {
            hub: self.clone(),
            node_id: node_id.into(),
        }
    }

    /// Simulate a crash or partition of `node_id`. Its subscriptions are closed, it no longer
    /// counts as a subscriber, and its publishes fail until `reconnect()`.
    pub fn disconnect(&self, node_id: &str) {
        let mut hub = self.lock();
        hub.disconnected.insert(node_id.to_string());
        for subscribers in hub.topics.values_mut() {
            subscribers.retain(|s| s.node_id != node_id);
        }
    }

    pub fn reconnect(&self, node_id: &str) {
        self.lock().disconnected.remove(node_id);
    }

    fn lock(&self) -> MutexGuard<'_, Hub> {
        self.hub.lock().expect("InMemoryGossip hub mutex guard poison")
    }

    fn publish(&self, from: &str, topic: &str, data: Bytes) -> Result<(), GossipError> {
        let mut hub = self.lock();
        if hub.disconnected.contains(from) {
            return Err(GossipError::Closed);
        }

        if let Some(subscribers) = hub.topics.get_mut(topic) {
            // Dropped subscriptions are pruned lazily here.
            subscribers.retain(|s| s.sender.send(data.clone()).is_ok());
        }

        Ok(())
    }

    fn subscribe(&self, node_id: &str, topic: &str) -> Result<InMemorySubscription, GossipError> {
        let mut hub = self.lock();
        if hub.disconnected.contains(node_id) {
            return Err(GossipError::Closed);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        hub.topics.entry(topic.to_string()).or_default().push(Subscriber {
            node_id: node_id.to_string(),
            sender,
        });

        Ok(InMemorySubscription { receiver })
    }

    fn subscriber_count(&self, node_id: &str, topic: &str) -> usize {
        let hub = self.lock();
        match hub.topics.get(topic) {
            None => 0,
            Some(subscribers) => subscribers
                .iter()
                .filter(|s| s.node_id != node_id && !s.sender.is_closed())
                .map(|s| s.node_id.as_str())
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

/// One member's view of an `InMemoryGossip` hub.
#[derive(Clone)]
pub struct InMemoryNetwork {
    hub: InMemoryGossip,
    node_id: String,
}

impl GossipNetwork for InMemoryNetwork {
    fn local_id(&self) -> String {
        self.node_id.clone()
    }

    fn join(&self, topic: &str) -> Result<Arc<dyn GossipTopic>, GossipError> {
        if self.hub.lock().disconnected.contains(&self.node_id) {
            return Err(GossipError::Closed);
        }

        Ok(Arc::new(InMemoryTopic {
            hub: self.hub.clone(),
            node_id: self.node_id.clone(),
            topic: topic.to_string(),
        }))
    }
}

struct InMemoryTopic {
    hub: InMemoryGossip,
    node_id: String,
    topic: String,
}

#[async_trait::async_trait]
impl GossipTopic for InMemoryTopic {
    fn name(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, data: Bytes) -> Result<(), GossipError> {
        self.hub.publish(&self.node_id, &self.topic, data)
    }

    async fn subscribe(&self) -> Result<Box<dyn GossipSubscription>, GossipError> {
        let subscription = self.hub.subscribe(&self.node_id, &self.topic)?;
        Ok(Box::new(subscription))
    }

    fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count(&self.node_id, &self.topic)
    }
}

struct InMemorySubscription {
    receiver: mpsc::UnboundedReceiver<Bytes>,
}

#[async_trait::async_trait]
impl GossipSubscription for InMemorySubscription {
    async fn next(&mut self) -> Option<Result<Bytes, GossipError>> {
        self.receiver.recv().await.map(Ok)
    }
}

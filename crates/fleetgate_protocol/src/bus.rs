//! Publish/subscribe bus abstraction.
//!
//! The coordination layer only ever needs two operations from the bus:
//! publishing a text payload on a named topic and receiving the payloads of
//! one topic in order. [`MessageBus`] captures exactly that, so any broker
//! client can back it. [`MemoryBus`] is the in-process implementation used by
//! single-instance deployments and tests.

use crate::error::BusError;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// A stream of raw payloads for one topic.
///
/// Each subscription is independent: dropping it unsubscribes, and a slow
/// consumer on one topic never delays another topic.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: mpsc::UnboundedReceiver<String>,
}

impl Subscription {
    /// Wraps a receiver that a bus client feeds with payloads for `topic`.
    pub fn new(topic: impl Into<String>, receiver: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next payload. Returns `None` once the bus side closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Returns a payload if one is already queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

/// Client side of the cluster broadcast bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes `payload` to every current subscriber of `topic`.
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError>;

    /// Opens a new subscription to `topic`.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError>;
}

/// In-process bus: fan-out over unbounded channels, one list per topic.
#[derive(Debug, Default)]
pub struct MemoryBus {
    topics: DashMap<String, Vec<mpsc::UnboundedSender<String>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError> {
        let Some(mut senders) = self.topics.get_mut(topic) else {
            trace!("No subscribers for '{}', dropping payload", topic);
            return Ok(());
        };

        // Dropped subscriptions are pruned lazily on the next publish
        senders.retain(|sender| sender.send(payload.clone()).is_ok());
        debug!("📤 Published to '{}' ({} subscribers)", topic, senders.len());
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.topics.entry(topic.to_string()).or_default().push(sender);
        Ok(Subscription::new(topic, receiver))
    }
}

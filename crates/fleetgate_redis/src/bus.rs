//! [`MessageBus`] over Redis pub/sub.
//!
//! Publishing shares one multiplexed connection. Every subscription opens its
//! own pub/sub connection and forwards payloads from a spawned task, so a
//! slow topic never holds up another one.

use async_trait::async_trait;
use fleetgate_protocol::{BusError, MessageBus, Subscription};
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisResult};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub struct RedisBus {
    client: Client,
    publisher: MultiplexedConnection,
}

impl RedisBus {
    /// Connects to the Redis server at `url` (`redis://[:password@]host[:port]`).
    pub async fn connect(url: &str) -> RedisResult<Self> {
        let client = Client::open(url)?;
        let publisher = client.get_multiplexed_async_connection().await?;
        info!("🔌 Connected to Redis bus at {}", client.get_connection_info().addr);
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError> {
        let mut connection = self.publisher.clone();
        let receivers: i64 = connection
            .publish(topic, payload)
            .await
            .map_err(|e| BusError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        trace!("📤 Published to '{}' ({} receivers)", topic, receivers);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        let failed = |e: redis::RedisError| BusError::Subscribe {
            topic: topic.to_string(),
            reason: e.to_string(),
        };

        let mut pubsub = self.client.get_async_pubsub().await.map_err(failed)?;
        pubsub.subscribe(topic).await.map_err(failed)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let channel = topic.to_string();
        tokio::spawn(async move {
            let mut messages = Box::pin(pubsub.into_on_message());
            loop {
                tokio::select! {
                    _ = sender.closed() => break,
                    message = messages.next() => match message {
                        Some(message) => match message.get_payload::<String>() {
                            Ok(payload) => {
                                if sender.send(payload).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("⚠️ Unreadable payload on '{}': {}", channel, e),
                        },
                        None => {
                            warn!("⚠️ Redis closed the subscription to '{}'", channel);
                            break;
                        }
                    },
                }
            }
            debug!("Redis subscription to '{}' ended", channel);
        });

        Ok(Subscription::new(topic, receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_non_redis_url() {
        assert!(RedisBus::connect("http://127.0.0.1:6379").await.is_err());
    }
}

//! In-process broker on tokio broadcast channels.

use async_trait::async_trait;
use conquiz_core::broker::{Consumer, Producer};
use conquiz_core::error::DomainError;
use dashmap::DashMap;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{trace, warn};

const DEFAULT_CAPACITY: usize = 256;

/// One broadcast channel per topic. Publishing to a topic nobody listens to
/// drops the message.
#[derive(Debug)]
pub struct InMemoryBroker {
    topics: DashMap<String, broadcast::Sender<String>>,
    capacity: usize,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InMemoryBroker {
    /// Creates a broker whose topics buffer up to `capacity` messages per
    /// slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Current number of subscribers of `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map_or(0, |sender| sender.receiver_count())
    }
}

#[async_trait]
impl Producer for InMemoryBroker {
    async fn publish(&self, topic: &str, message: String) -> Result<(), DomainError> {
        let Some(sender) = self.topics.get(topic) else {
            trace!(topic, "no subscribers");
            return Ok(());
        };
        if sender.send(message).is_err() {
            trace!(topic, "all subscribers left");
            drop(sender);
            self.topics
                .remove_if(topic, |_, sender| sender.receiver_count() == 0);
        }
        Ok(())
    }
}

#[async_trait]
impl Consumer for InMemoryBroker {
    async fn listen(&self, topic: &str) -> Result<BoxStream<'static, String>, DomainError> {
        let receiver = self
            .topics
            .entry(topic.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        let topic = topic.to_owned();
        Ok(BroadcastStream::new(receiver)
            .filter_map(move |item| {
                let message = match item {
                    Ok(message) => Some(message),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(topic = %topic, skipped, "subscriber lagged, messages skipped");
                        None
                    }
                };
                futures::future::ready(message)
            })
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_publish_reaches_every_listener_of_topic() {
        // Arrange
        let broker = InMemoryBroker::default();
        let mut first = broker.listen("game-1").await.unwrap();
        let mut second = broker.listen("game-1").await.unwrap();
        let mut other = broker.listen("game-2").await.unwrap();

        // Act
        broker.publish("game-1", "hello".to_owned()).await.unwrap();

        // Assert
        assert_eq!(first.next().await.as_deref(), Some("hello"));
        assert_eq!(second.next().await.as_deref(), Some("hello"));
        let nothing = tokio::time::timeout(Duration::from_millis(50), other.next()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_publish_without_listeners_is_dropped() {
        let broker = InMemoryBroker::default();

        broker.publish("empty", "lost".to_owned()).await.unwrap();

        assert_eq!(broker.subscriber_count("empty"), 0);
    }

    #[tokio::test]
    async fn test_dropping_stream_unsubscribes() {
        let broker = InMemoryBroker::default();
        let stream = broker.listen("game-1").await.unwrap();
        assert_eq!(broker.subscriber_count("game-1"), 1);

        drop(stream);
        broker.publish("game-1", "bye".to_owned()).await.unwrap();

        assert_eq!(broker.subscriber_count("game-1"), 0);
    }

    #[tokio::test]
    async fn test_lagging_listener_skips_to_latest() {
        let broker = InMemoryBroker::new(2);
        let mut stream = broker.listen("game-1").await.unwrap();

        for n in 0..4 {
            broker.publish("game-1", n.to_string()).await.unwrap();
        }

        assert_eq!(stream.next().await.as_deref(), Some("2"));
        assert_eq!(stream.next().await.as_deref(), Some("3"));
    }
}

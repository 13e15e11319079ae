//! Registry of channels grouped by game.

use std::collections::HashMap;
use std::sync::Arc;

use conquiz_core::broker::Consumer;
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::channel::Channel;
use crate::connection::{ConnectionId, WebSocketConnection};
use crate::error::ChannelError;

/// Maps a group to the channels of its member connections. The group name is
/// also the broker topic.
pub struct ChannelLayer {
    consumer: Arc<dyn Consumer>,
    groups: DashMap<String, HashMap<ConnectionId, Channel>>,
}

impl std::fmt::Debug for ChannelLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLayer")
            .field("groups", &self.groups.len())
            .finish_non_exhaustive()
    }
}

impl ChannelLayer {
    /// Creates an empty layer reading from `consumer`.
    #[must_use]
    pub fn new(consumer: Arc<dyn Consumer>) -> Self {
        Self {
            consumer,
            groups: DashMap::new(),
        }
    }

    /// Subscribes `connection` to `group`. Joining a group twice replaces the
    /// earlier channel. Members whose connection has closed are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Broker` if the subscription fails.
    #[instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    pub async fn group_add(
        &self,
        group: &str,
        connection: Arc<dyn WebSocketConnection>,
    ) -> Result<(), ChannelError> {
        let connection_id = connection.id();
        let channel = Channel::open(self.consumer.as_ref(), group, connection).await?;
        let mut members = self.groups.entry(group.to_owned()).or_default();
        members.retain(|_, member| !member.is_finished());
        members.insert(connection_id, channel);
        debug!(members = members.len(), "joined group");
        Ok(())
    }

    /// Removes `connection_id` from `group`, stopping its forwarding task.
    /// Empty groups are dropped. Unknown members are ignored.
    #[instrument(skip(self))]
    pub fn group_discard(&self, group: &str, connection_id: ConnectionId) {
        let removed = self
            .groups
            .get_mut(group)
            .and_then(|mut members| members.remove(&connection_id));
        self.groups.remove_if(group, |_, members| members.is_empty());
        if removed.is_some() {
            debug!("left group");
        }
    }

    /// Number of connections in `group`.
    #[must_use]
    pub fn group_size(&self, group: &str) -> usize {
        self.groups.get(group).map_or(0, |members| members.len())
    }

    /// Number of non-empty groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryBroker;
    use async_trait::async_trait;
    use conquiz_core::broker::Producer;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct TestConnection {
        id: ConnectionId,
        frames: mpsc::UnboundedSender<String>,
        closed: AtomicBool,
    }

    impl TestConnection {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (frames, received) = mpsc::unbounded_channel();
            let connection = Arc::new(Self {
                id: ConnectionId::generate(),
                frames,
                closed: AtomicBool::new(false),
            });
            (connection, received)
        }
    }

    #[async_trait]
    impl WebSocketConnection for TestConnection {
        fn id(&self) -> ConnectionId {
            self.id
        }

        async fn send(&self, text: String) -> Result<(), ChannelError> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(ChannelError::Closed);
            }
            self.frames.send(text).map_err(|_| ChannelError::Closed)
        }
    }

    async fn next_frame(received: &mut mpsc::UnboundedReceiver<String>) -> Option<String> {
        tokio::time::timeout(Duration::from_millis(200), received.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_group_members_receive_group_messages_only() {
        // Arrange
        let broker = Arc::new(InMemoryBroker::default());
        let layer = ChannelLayer::new(broker.clone());
        let (alice, mut alice_frames) = TestConnection::new();
        let (bob, mut bob_frames) = TestConnection::new();
        let (carol, mut carol_frames) = TestConnection::new();
        layer.group_add("game-a", alice).await.unwrap();
        layer.group_add("game-a", bob).await.unwrap();
        layer.group_add("game-b", carol).await.unwrap();

        // Act
        broker.publish("game-a", "event".to_owned()).await.unwrap();

        // Assert
        assert_eq!(next_frame(&mut alice_frames).await.as_deref(), Some("event"));
        assert_eq!(next_frame(&mut bob_frames).await.as_deref(), Some("event"));
        assert_eq!(next_frame(&mut carol_frames).await, None);
        assert_eq!(layer.group_size("game-a"), 2);
        assert_eq!(layer.group_count(), 2);
    }

    #[tokio::test]
    async fn test_discarded_connection_stops_receiving() {
        // Arrange
        let broker = Arc::new(InMemoryBroker::default());
        let layer = ChannelLayer::new(broker.clone());
        let (alice, mut alice_frames) = TestConnection::new();
        let alice_id = alice.id;
        layer.group_add("game-a", alice).await.unwrap();

        // Act
        layer.group_discard("game-a", alice_id);
        broker.publish("game-a", "late".to_owned()).await.unwrap();

        // Assert
        assert_eq!(next_frame(&mut alice_frames).await, None);
        assert_eq!(layer.group_size("game-a"), 0);
        assert_eq!(layer.group_count(), 0);
    }

    #[tokio::test]
    async fn test_discard_unknown_member_is_ignored() {
        let layer = ChannelLayer::new(Arc::new(InMemoryBroker::default()));

        layer.group_discard("game-a", ConnectionId::generate());

        assert_eq!(layer.group_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_connection_does_not_disturb_others() {
        // Arrange
        let broker = Arc::new(InMemoryBroker::default());
        let layer = ChannelLayer::new(broker.clone());
        let (gone, _gone_frames) = TestConnection::new();
        gone.closed.store(true, Ordering::SeqCst);
        let (alice, mut alice_frames) = TestConnection::new();
        layer.group_add("game-a", gone).await.unwrap();
        layer.group_add("game-a", alice).await.unwrap();

        // Act
        broker.publish("game-a", "one".to_owned()).await.unwrap();
        broker.publish("game-a", "two".to_owned()).await.unwrap();

        // Assert
        assert_eq!(next_frame(&mut alice_frames).await.as_deref(), Some("one"));
        assert_eq!(next_frame(&mut alice_frames).await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_closed_members_are_dropped_on_next_join() {
        // Arrange
        let broker = Arc::new(InMemoryBroker::default());
        let layer = ChannelLayer::new(broker.clone());
        let (gone, _gone_frames) = TestConnection::new();
        gone.closed.store(true, Ordering::SeqCst);
        let (alice, mut alice_frames) = TestConnection::new();
        layer.group_add("game-a", gone).await.unwrap();
        layer.group_add("game-a", alice).await.unwrap();
        broker.publish("game-a", "one".to_owned()).await.unwrap();
        assert_eq!(next_frame(&mut alice_frames).await.as_deref(), Some("one"));
        tokio::time::timeout(Duration::from_secs(1), async {
            while !layer.groups.get("game-a").unwrap().values().any(Channel::is_finished) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // Act
        let (bob, _bob_frames) = TestConnection::new();
        layer.group_add("game-a", bob).await.unwrap();

        // Assert
        assert_eq!(layer.group_size("game-a"), 2);
    }
}

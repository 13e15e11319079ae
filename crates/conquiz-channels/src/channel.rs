//! A single forwarding subscription.

use std::sync::Arc;

use conquiz_core::broker::Consumer;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::connection::{ConnectionId, WebSocketConnection};
use crate::error::ChannelError;

/// Forwards every message of a topic to one connection until dropped.
#[derive(Debug)]
pub struct Channel {
    task: JoinHandle<()>,
}

impl Channel {
    /// Subscribes to `topic` and spawns the forwarding task. Messages
    /// published after this returns are delivered.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Broker` if the subscription fails.
    pub async fn open(
        consumer: &dyn Consumer,
        topic: &str,
        connection: Arc<dyn WebSocketConnection>,
    ) -> Result<Self, ChannelError> {
        let mut messages = consumer.listen(topic).await?;
        let connection_id = connection.id();
        let owned_topic = topic.to_owned();
        let task = tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                match connection.send(message).await {
                    Ok(()) => {}
                    Err(ChannelError::Closed) => {
                        debug!(%connection_id, topic = %owned_topic, "connection closed, dropping message");
                        break;
                    }
                    Err(e) => {
                        debug!(%connection_id, topic = %owned_topic, error = %e, "send failed, dropping message");
                    }
                }
            }
        });
        Ok(Self { task })
    }

    /// Whether the forwarding task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

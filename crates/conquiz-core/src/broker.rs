//! Broker ports: the seam between published domain events and subscribers.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::DomainError;

/// Publishes serialized messages onto a named topic.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Publish `message` to every current subscriber of `topic`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the broker is unreachable.
    async fn publish(&self, topic: &str, message: String) -> Result<(), DomainError>;
}

/// Subscribes to a named topic.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Returns a stream of the messages published to `topic` from now on.
    /// Dropping the stream unsubscribes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the subscription cannot be
    /// established.
    async fn listen(&self, topic: &str) -> Result<BoxStream<'static, String>, DomainError>;
}

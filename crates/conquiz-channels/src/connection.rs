//! The outbound side of a client connection.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ChannelError;

/// Identifier of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Generates a fresh connection identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A connection text frames can be pushed to.
#[async_trait]
pub trait WebSocketConnection: Send + Sync {
    /// The connection identifier.
    fn id(&self) -> ConnectionId;

    /// Push one text frame.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Closed` once the client went away.
    async fn send(&self, text: String) -> Result<(), ChannelError>;
}

//! Channel layer errors.

use conquiz_core::error::DomainError;
use thiserror::Error;

/// Errors raised while wiring connections to broker topics.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The connection is gone.
    #[error("connection closed")]
    Closed,

    /// The broker refused the subscription.
    #[error(transparent)]
    Broker(#[from] DomainError),
}

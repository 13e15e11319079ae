//! Conquiz — channel layer.
//!
//! Connections join a group named after a game. Every group member gets a
//! channel: a task forwarding the group's broker topic to the connection.

mod broker;
mod channel;
mod connection;
mod error;
mod layer;

pub use broker::InMemoryBroker;
pub use channel::Channel;
pub use connection::{ConnectionId, WebSocketConnection};
pub use error::ChannelError;
pub use layer::ChannelLayer;

//! Conquiz — HTTP and WebSocket server library.
//!
//! Exposes the router, state and configuration so integration tests can
//! build the same application as the binary.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod routes;
pub mod seats;
pub mod state;
pub mod timers;

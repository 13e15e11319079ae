//! Application layer: ports, unit of work and the message bus that drives a
//! game from one inbound command to quiescence.

pub mod command_handlers;
pub mod dispatch;
pub mod error;
pub mod event_handlers;
pub mod message_bus;
pub mod messages;
pub mod ports;
pub mod query_handlers;
pub mod unit_of_work;

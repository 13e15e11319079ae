//! Conquiz — game bounded context.
//!
//! Holds the `Game` aggregate with its preparatory, capturing and battling
//! stages, the turn-selection and conflict-resolution strategies, and the
//! message bus that chains command and event handlers until a game reaches
//! quiescence.

pub mod application;
pub mod domain;

//! Aggregate root abstraction.

use crate::event::DomainEvent;

/// Trait for aggregate roots that buffer the events their mutations produce.
pub trait AggregateRoot: Send + Sync {
    /// Identifier type of the aggregate.
    type Id: Copy + std::fmt::Display;

    /// The event type this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Self::Id;

    /// Returns the committed version (number of events already drained).
    fn version(&self) -> i64;

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Swaps the pending buffer out and advances the version by the number of
    /// drained events. A second call without new mutations returns nothing.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>;
}

//! Command abstractions.

use uuid::Uuid;

/// An intent addressed to exactly one aggregate.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted type name used in logs, e.g. `game.mark_field`.
    fn command_type(&self) -> &'static str;

    /// The aggregate the command targets.
    fn aggregate_id(&self) -> Uuid;
}

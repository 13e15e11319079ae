//! Board tiles.

use serde::{Deserialize, Serialize};

use super::values::{FieldId, PlayerId};

/// Ownership binding of a field to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedField {
    /// The owning player.
    pub owner: PlayerId,
    /// Whether the field is the owner's base.
    pub is_base: bool,
}

/// A claimable board tile. Its value grows with every capture and defence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field identifier.
    pub id: FieldId,
    /// Points the field is worth to its owner.
    pub value: i64,
    /// Current ownership, if captured.
    pub captured: Option<CapturedField>,
}

impl Field {
    /// Creates an unowned field worth nothing.
    #[must_use]
    pub fn new(id: FieldId) -> Self {
        Self {
            id,
            value: 0,
            captured: None,
        }
    }

    /// Returns the owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<PlayerId> {
        self.captured.map(|captured| captured.owner)
    }

    /// Returns true if some player owns the field.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured.is_some()
    }

    /// Returns true if `player_id` owns the field.
    #[must_use]
    pub fn is_owned_by(&self, player_id: PlayerId) -> bool {
        self.owner() == Some(player_id)
    }

    pub(crate) fn capture(&mut self, owner: PlayerId, is_base: bool, step: i64) {
        self.captured = Some(CapturedField { owner, is_base });
        self.value += step;
    }

    pub(crate) fn defend(&mut self, step: i64) {
        self.value += step;
    }
}

//! State of the select-base stage.

use serde::{Deserialize, Serialize};

/// Round counter of the preparatory stage. One round per player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preparation {
    /// Current 1-based round, `0` before the stage starts.
    pub round_number: u32,
    /// Set once the active player has a base for this round.
    pub round_closed: bool,
}

impl Preparation {
    pub(crate) fn start(&mut self) {
        self.round_number = 1;
        self.round_closed = false;
    }

    pub(crate) fn stop_round(&mut self) {
        self.round_number += 1;
        self.round_closed = false;
    }
}

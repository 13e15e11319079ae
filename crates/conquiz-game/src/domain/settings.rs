//! Tunable rules of a game.

use conquiz_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Settings snapshotted into every game at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Seats in a game; it starts as soon as they are filled.
    pub players_count_to_start: usize,
    /// Number of fields on the board.
    pub fields_count: usize,
    /// Battling rounds per player; each player attacks this many times.
    pub battle_rounds_per_player: u32,
    /// Maximum number of question rounds in a duel.
    pub duel_max_rounds: u32,
    /// Time a player has to act in a round.
    pub round_time_seconds: u64,
    /// Time players have to answer a question.
    pub question_time_seconds: u64,
    /// Value added to a field on capture and on successful defence.
    pub field_value_step: i64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            players_count_to_start: 2,
            fields_count: 9,
            battle_rounds_per_player: 2,
            duel_max_rounds: 3,
            round_time_seconds: 30,
            question_time_seconds: 15,
            field_value_step: 100,
        }
    }
}

impl GameSettings {
    /// Number of battling rounds for `players` seated players.
    #[must_use]
    pub fn battle_rounds_count(&self, players: usize) -> u32 {
        self.battle_rounds_per_player
            .saturating_mul(u32::try_from(players).unwrap_or(u32::MAX))
    }

    /// Checks that the settings describe a playable game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first offending setting.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.players_count_to_start < 2 {
            return Err(DomainError::Validation(
                "players_count_to_start must be at least 2".to_owned(),
            ));
        }
        if self.fields_count < self.players_count_to_start {
            return Err(DomainError::Validation(
                "fields_count must be at least players_count_to_start".to_owned(),
            ));
        }
        if self.duel_max_rounds == 0 {
            return Err(DomainError::Validation(
                "duel_max_rounds must be positive".to_owned(),
            ));
        }
        if self.field_value_step <= 0 {
            return Err(DomainError::Validation(
                "field_value_step must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

//! Open sockets per seated player.

use conquiz_game::domain::values::{GameId, PlayerId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Counts the live connections of each player in each game. A player keeps
/// the seat until their last connection closes.
#[derive(Debug, Default)]
pub struct SeatRegistry {
    connections: DashMap<(GameId, PlayerId), usize>,
}

impl SeatRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new connection and returns how many the player now has.
    pub fn join(&self, game_id: GameId, player_id: PlayerId) -> usize {
        let mut count = self.connections.entry((game_id, player_id)).or_insert(0);
        *count += 1;
        *count
    }

    /// Records a closed connection. Returns `true` when it was the player's
    /// last one in the game.
    pub fn leave(&self, game_id: GameId, player_id: PlayerId) -> bool {
        match self.connections.entry((game_id, player_id)) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > 1 {
                    *entry.get_mut() -= 1;
                    false
                } else {
                    entry.remove();
                    true
                }
            }
            Entry::Vacant(_) => true,
        }
    }
}

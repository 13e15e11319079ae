//! Turn-order policies.

use std::fmt::Debug;

use super::player::Player;
use super::values::PlayerId;

/// Decides in which order players take turns.
///
/// Rounds are 1-based: round `n` belongs to
/// `get_order(players)[(n - 1) % players.len()]`.
pub trait PlayerTurnSelector: Send + Sync + Debug {
    /// Returns every player's id in turn order.
    fn get_order(&self, players: &[Player]) -> Vec<PlayerId>;

    /// Returns the player whose turn `round_number` is, or `None` for an
    /// empty table or round `0`.
    fn select(&self, round_number: u32, players: &[Player]) -> Option<PlayerId> {
        turn_of(round_number, &self.get_order(players))
    }
}

/// The player whose turn `round_number` is in a fixed `order`.
#[must_use]
pub fn turn_of(round_number: u32, order: &[PlayerId]) -> Option<PlayerId> {
    if order.is_empty() {
        return None;
    }
    let index = usize::try_from(round_number.checked_sub(1)?).ok()? % order.len();
    order.get(index).copied()
}

/// Orders players by descending id.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityPlayerTurnSelector;

impl PlayerTurnSelector for IdentityPlayerTurnSelector {
    fn get_order(&self, players: &[Player]) -> Vec<PlayerId> {
        let mut order: Vec<PlayerId> = players.iter().map(|player| player.id).collect();
        order.sort_unstable_by(|a, b| b.cmp(a));
        order
    }
}

/// Orders players by connection time, breaking ties by id.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectionTimeAndIdentityPlayerTurnSelector;

impl PlayerTurnSelector for ConnectionTimeAndIdentityPlayerTurnSelector {
    fn get_order(&self, players: &[Player]) -> Vec<PlayerId> {
        let mut sorted: Vec<&Player> = players.iter().collect();
        sorted.sort_by_key(|player| (player.connected_at, player.id));
        sorted.into_iter().map(|player| player.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use conquiz_test_support::fixed_time;

    fn players() -> Vec<Player> {
        let t0 = fixed_time();
        vec![
            Player::new(PlayerId(2), t0 + Duration::seconds(5)),
            Player::new(PlayerId(3), t0),
            Player::new(PlayerId(1), t0 + Duration::seconds(5)),
        ]
    }

    #[test]
    fn test_turn_of_cycles_through_a_fixed_order() {
        let order = [PlayerId(9), PlayerId(4)];

        let turns: Vec<_> = (1..=3).map(|round| turn_of(round, &order)).collect();

        assert_eq!(turns, vec![Some(PlayerId(9)), Some(PlayerId(4)), Some(PlayerId(9))]);
        assert_eq!(turn_of(0, &order), None);
        assert_eq!(turn_of(1, &[]), None);
    }

    #[test]
    fn test_identity_selector_orders_by_descending_id() {
        let order = IdentityPlayerTurnSelector.get_order(&players());

        assert_eq!(order, vec![PlayerId(3), PlayerId(2), PlayerId(1)]);
    }

    #[test]
    fn test_connection_time_selector_breaks_ties_by_id() {
        let order = ConnectionTimeAndIdentityPlayerTurnSelector.get_order(&players());

        assert_eq!(order, vec![PlayerId(3), PlayerId(1), PlayerId(2)]);
    }

    #[test]
    fn test_select_wraps_one_based_rounds() {
        let selector = ConnectionTimeAndIdentityPlayerTurnSelector;
        let players = players();

        let picked: Vec<_> = (1..=4)
            .map(|round| selector.select(round, &players))
            .collect();

        assert_eq!(
            picked,
            vec![
                Some(PlayerId(3)),
                Some(PlayerId(1)),
                Some(PlayerId(2)),
                Some(PlayerId(3)),
            ]
        );
    }

    #[test]
    fn test_select_is_pure_and_idempotent() {
        let selector = IdentityPlayerTurnSelector;
        let players = players();

        for round in 1..=6 {
            let first = selector.select(round, &players);
            let second = selector.select(round, &players);
            assert_eq!(first, second);
        }
        assert_eq!(players.len(), 3);
    }

    #[test]
    fn test_select_without_players_or_round_zero_is_none() {
        let selector = IdentityPlayerTurnSelector;

        assert_eq!(selector.select(1, &[]), None);
        assert_eq!(selector.select(0, &players()), None);
    }
}

use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

/// The opaque token that identifies a player.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(token: &str) -> Self {
        Self(String::from(token))
    }
}

impl From<String> for PlayerId {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a player is in their turn, with the placement indices of the cards
/// they are holding on to.
///
/// `OneInvalid`, `TwoMatch` and `TwoNoMatch` are settled at the start of the
/// player's next flip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    /// No cards held.
    #[default]
    Fresh,
    /// Controls one card and may flip a second one.
    OneValid(usize),
    /// The second flip failed. The first card was given up but stays face up.
    OneInvalid(usize),
    /// Controls two cards with the same value. They are removed on settlement.
    TwoMatch([usize; 2]),
    /// Two cards with different values, both given up but left face up.
    TwoNoMatch([usize; 2]),
}

impl TurnState {
    /// The cards that are part of this turn, in the order they were flipped.
    pub fn held_cards(&self) -> &[usize] {
        match self {
            TurnState::Fresh => &[],
            TurnState::OneValid(card) | TurnState::OneInvalid(card) => std::slice::from_ref(card),
            TurnState::TwoMatch(cards) | TurnState::TwoNoMatch(cards) => cards,
        }
    }

    /// Whether the next flip has to settle this turn first.
    pub fn is_pending_settlement(&self) -> bool {
        matches!(
            self,
            TurnState::OneInvalid(_) | TurnState::TwoMatch(_) | TurnState::TwoNoMatch(_)
        )
    }
}

/// A participant in the game.
///
/// Created on first reference through [`Board::player()`](crate::Board::player)
/// and kept for the lifetime of the board. Two players are equal if their
/// tokens are.
#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    score: AtomicUsize,
    attempted: AtomicBool,
    // Held for the whole duration of a flip by this player.
    turn: Mutex<TurnState>,
}

impl Player {
    pub(crate) fn new(id: PlayerId) -> Self {
        Self {
            id,
            score: AtomicUsize::new(0),
            attempted: AtomicBool::new(false),
            turn: Mutex::new(TurnState::Fresh),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// The number of pairs this player has matched.
    pub fn score(&self) -> usize {
        self.score.load(Ordering::Relaxed)
    }

    /// Whether this player has ever tried to flip a card.
    pub fn has_attempted(&self) -> bool {
        self.attempted.load(Ordering::Relaxed)
    }

    /// The current turn state.
    ///
    /// Blocks while this player has a flip in progress.
    pub fn turn_state(&self) -> TurnState {
        *self.turn.lock()
    }

    pub(crate) fn mark_attempted(&self) {
        self.attempted.store(true, Ordering::Relaxed);
    }

    pub(crate) fn increment_score(&self) {
        self.score.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn lock_turn(&self) -> MutexGuard<'_, TurnState> {
        self.turn.lock()
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl std::hash::Hash for Player {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One line of the score table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score {
    pub player: PlayerId,
    pub score: usize,
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.player, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_cards_match_turn_state() {
        assert!(TurnState::Fresh.held_cards().is_empty());
        assert_eq!(TurnState::OneValid(3).held_cards(), &[3]);
        assert_eq!(TurnState::OneInvalid(4).held_cards(), &[4]);
        assert_eq!(TurnState::TwoMatch([5, 1]).held_cards(), &[5, 1]);
        assert_eq!(TurnState::TwoNoMatch([0, 2]).held_cards(), &[0, 2]);
    }

    #[test]
    fn pending_settlement_states() {
        assert!(!TurnState::Fresh.is_pending_settlement());
        assert!(!TurnState::OneValid(0).is_pending_settlement());
        assert!(TurnState::OneInvalid(0).is_pending_settlement());
        assert!(TurnState::TwoMatch([0, 1]).is_pending_settlement());
        assert!(TurnState::TwoNoMatch([0, 1]).is_pending_settlement());
    }

    #[test]
    fn new_player() {
        let player = Player::new(PlayerId::from("alice"));
        assert_eq!(player.id().as_str(), "alice");
        assert_eq!(player.score(), 0);
        assert!(!player.has_attempted());
        assert_eq!(player.turn_state(), TurnState::Fresh);

        player.mark_attempted();
        player.increment_score();
        assert!(player.has_attempted());
        assert_eq!(player.score(), 1);
    }

    #[test]
    fn players_are_equal_by_token() {
        let a = Player::new(PlayerId::from("a"));
        let also_a = Player::new(PlayerId::from(String::from("a")));
        also_a.increment_score();
        assert_eq!(a, also_a);
        assert_ne!(a, Player::new(PlayerId::from("b")));
    }

    #[test]
    fn score_line() {
        let score = Score {
            player: PlayerId::from("bob"),
            score: 3,
        };
        assert_eq!(score.to_string(), "bob 3");
    }
}

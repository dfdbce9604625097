mod error;
mod parse;
mod render;
mod watch;

use std::collections::HashMap;
use std::sync::Arc;

pub use error::*;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::{Card, CardState, Player, PlayerId, Score, TurnState};
use watch::WatchRegistry;

/// A grid of cards shared by any number of concurrently flipping players.
///
/// There is no lock over the whole board. Every card has its own lock, and
/// operations that need two cards take both locks in increasing order of
/// placement index. A player's turn state is locked for the duration of
/// that player's flip.
pub struct Board {
    rows: usize,
    cols: usize,
    /// Row-major, so the position in this list is the card's placement index.
    cards: Vec<Card>,
    players: Mutex<HashMap<PlayerId, Arc<Player>>>,
    watchers: WatchRegistry,
}

enum FlipOutcome {
    Done { visible_change: bool },
    /// The target is controlled by another player.
    Contended,
}

impl Board {
    /// Creates a board from card values in row-major order.
    pub fn new(rows: usize, cols: usize, values: Vec<String>) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::ZeroDimension { rows, cols });
        }
        let expected = rows.saturating_mul(cols);
        if values.len() != expected {
            return Err(BoardError::WrongCardCount {
                expected,
                found: values.len(),
            });
        }
        let cards = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| Card::new(value, index))
            .collect();
        Ok(Self {
            rows,
            cols,
            cards,
            players: Mutex::new(HashMap::new()),
            watchers: WatchRegistry::default(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All cards, in row-major order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, row: usize, col: usize) -> Option<&Card> {
        self.index_of(row, col).map(|index| &self.cards[index])
    }

    fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    /// Looks up the player with this token, creating them on first use.
    pub fn player(&self, token: &str) -> Arc<Player> {
        let mut players = self.players.lock();
        let player = players
            .entry(PlayerId::from(token))
            .or_insert_with_key(|id| Arc::new(Player::new(id.clone())));
        Arc::clone(player)
    }

    /// The scores of every player that has tried to flip a card, in no
    /// particular order.
    pub fn scores(&self) -> Vec<Score> {
        self.players
            .lock()
            .values()
            .filter(|player| player.has_attempted())
            .map(|player| Score {
                player: player.id().clone(),
                score: player.score(),
            })
            .collect()
    }

    /// Calls `callback` once, with the board as seen by `player`, the next
    /// time a card turns face up, face down or is removed.
    ///
    /// A player has at most one pending registration. Registering again
    /// replaces the previous callback, which is then dropped without being
    /// called. The callback runs on the thread that
    /// changed the board, so it should hand the board off rather than call
    /// back into [`Board::flip()`].
    pub fn watch<F>(&self, player: &Player, callback: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.watchers.register(player.id().clone(), Box::new(callback));
    }

    /// Flips the card at (`row`, `col`) for `player`.
    ///
    /// If the player's previous turn is still pending, it is settled first:
    /// a matched pair is removed, and cards from a failed turn are turned
    /// face down unless somebody else has taken them in the meantime.
    ///
    /// Then, as the first card of a turn, the card is turned face up (if
    /// needed) and controlled by the player. If another player controls it,
    /// this blocks until it is given up, and then starts over. As the
    /// second card, it is either matched with the first, or both are given
    /// up and stay face up. Flipping a removed card or a card controlled by
    /// anyone as the second card fails, and the first card is given up.
    ///
    /// Coordinates outside of the board are ignored.
    ///
    /// Settling and flipping lock their cards separately, so a concurrent
    /// [`Board::render_for()`] may see the board after settlement but before
    /// the new card is flipped. Watchers only get the state after both.
    pub fn flip(&self, player: &Player, row: usize, col: usize) {
        let Some(target) = self.index_of(row, col) else {
            debug!(player = %player.id(), row, col, "Ignoring flip outside of the board");
            return;
        };
        trace!(player = %player.id(), row, col, "Flip requested");
        player.mark_attempted();

        let mut turn = player.lock_turn();
        let mut visible_change = false;
        loop {
            visible_change |= self.settle(player.id(), &mut turn);
            match self.flip_target(player, &mut turn, target) {
                FlipOutcome::Done {
                    visible_change: changed,
                } => {
                    visible_change |= changed;
                    break;
                }
                FlipOutcome::Contended => {
                    if std::mem::take(&mut visible_change) {
                        self.notify_watchers();
                    }
                    debug!(player = %player.id(), row, col, "Card is controlled by another player, waiting");
                    self.cards[target].wait_until_unowned();
                }
            }
        }
        if visible_change {
            self.notify_watchers();
        }
        trace!(player = %player.id(), row, col, turn = ?*turn, "Flip done");
    }

    /// Resolves a pending turn. Returns whether any card changed visibly.
    fn settle(&self, player: &PlayerId, turn: &mut TurnState) -> bool {
        let visible_change = match *turn {
            TurnState::Fresh | TurnState::OneValid(_) => return false,
            TurnState::TwoMatch([first, second]) => {
                let (mut a, mut b) = self.lock_pair(first, second);
                self.remove_matched(player, first, &mut a);
                self.remove_matched(player, second, &mut b);
                true
            }
            TurnState::TwoNoMatch([first, second]) => {
                let (mut a, mut b) = self.lock_pair(first, second);
                let first_turned = turn_down_if_abandoned(&mut a);
                let second_turned = turn_down_if_abandoned(&mut b);
                first_turned || second_turned
            }
            TurnState::OneInvalid(card) => {
                let mut state = self.cards[card].lock();
                turn_down_if_abandoned(&mut state)
            }
        };
        debug!(player = %player, turn = ?*turn, visible_change, "Settled previous turn");
        *turn = TurnState::Fresh;
        visible_change
    }

    fn remove_matched(&self, player: &PlayerId, index: usize, state: &mut MutexGuard<'_, CardState>) {
        let owner = state.release();
        debug_assert_eq!(&owner, player);
        state.mark_removed();
        self.cards[index].notify_released(state);
    }

    /// Processes the newly requested card. `turn` must be settled.
    fn flip_target(&self, player: &Player, turn: &mut TurnState, target: usize) -> FlipOutcome {
        match *turn {
            TurnState::Fresh => self.flip_first(player.id(), turn, target),
            TurnState::OneValid(first) => FlipOutcome::Done {
                visible_change: self.flip_second(player, turn, first, target),
            },
            pending => panic!("Flipping a card for a turn that was not settled: {:?}", pending),
        }
    }

    fn flip_first(&self, player: &PlayerId, turn: &mut TurnState, target: usize) -> FlipOutcome {
        let mut state = self.cards[target].lock();
        if state.is_removed() {
            return FlipOutcome::Done {
                visible_change: false,
            };
        }
        let visible_change = if !state.is_face_up() {
            state.flip_up();
            true
        } else if !state.is_owned() {
            false
        } else {
            debug_assert!(!state.is_owned_by(player));
            return FlipOutcome::Contended;
        };
        state.claim(player);
        *turn = TurnState::OneValid(target);
        FlipOutcome::Done { visible_change }
    }

    fn flip_second(&self, player: &Player, turn: &mut TurnState, first: usize, target: usize) -> bool {
        if first == target {
            // The player's own card counts as controlled, so this fails.
            let mut held = self.cards[first].lock();
            self.give_up(first, &mut held);
            *turn = TurnState::OneInvalid(first);
            return false;
        }

        let (mut held, mut next) = self.lock_pair(first, target);
        debug_assert!(held.is_owned_by(player.id()));
        if next.is_removed() || next.is_owned() {
            self.give_up(first, &mut held);
            *turn = TurnState::OneInvalid(first);
            return false;
        }

        let visible_change = !next.is_face_up();
        if visible_change {
            next.flip_up();
        }
        next.claim(player.id());
        if self.cards[first].value() == self.cards[target].value() {
            player.increment_score();
            *turn = TurnState::TwoMatch([first, target]);
        } else {
            self.give_up(first, &mut held);
            self.give_up(target, &mut next);
            *turn = TurnState::TwoNoMatch([first, target]);
        }
        visible_change
    }

    fn give_up(&self, index: usize, state: &mut MutexGuard<'_, CardState>) {
        state.release();
        self.cards[index].notify_released(state);
    }

    /// Locks two distinct cards in increasing index order, returning the
    /// guards in argument order.
    fn lock_pair(
        &self,
        first: usize,
        second: usize,
    ) -> (MutexGuard<'_, CardState>, MutexGuard<'_, CardState>) {
        assert_ne!(first, second, "lock_pair() called with the same card twice");
        if first < second {
            let a = self.cards[first].lock();
            let b = self.cards[second].lock();
            (a, b)
        } else {
            let b = self.cards[second].lock();
            let a = self.cards[first].lock();
            (a, b)
        }
    }

    fn notify_watchers(&self) {
        self.watchers.deliver(|viewer| self.render_for(viewer));
    }
}

/// Turns a card from a failed turn face down, unless it is gone or someone
/// else has taken it. Returns whether it was turned.
fn turn_down_if_abandoned(state: &mut CardState) -> bool {
    if !state.is_removed() && state.is_face_up() && !state.is_owned() {
        state.flip_down();
        true
    } else {
        false
    }
}

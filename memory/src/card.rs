use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::PlayerId;

/// A single card on the board.
///
/// The value and placement index never change. Everything else lives in a
/// [`CardState`] behind the card's own lock, and can only be mutated through
/// the guard returned by [`Card::lock()`].
#[derive(Debug)]
pub struct Card {
    index: usize,
    value: String,
    state: Mutex<CardState>,
    released: Condvar,
}

/// The mutable part of a card.
///
/// Invariants:
/// - a removed card has no owner
/// - an owned card is face up (equivalently: a face-down card has no owner)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardState {
    face_up: bool,
    owner: Option<PlayerId>,
    removed: bool,
}

impl Card {
    pub(crate) fn new(value: String, index: usize) -> Self {
        Self {
            index,
            value,
            state: Mutex::new(CardState::default()),
            released: Condvar::new(),
        }
    }

    /// The placement index, unique on its board. Locks on several cards are
    /// always taken in increasing order of this index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Takes this card's exclusive lock.
    pub(crate) fn lock(&self) -> MutexGuard<'_, CardState> {
        self.state.lock()
    }

    /// A copy of the current state, taken under the lock.
    pub fn snapshot(&self) -> CardState {
        self.state.lock().clone()
    }

    /// Wakes every thread blocked in [`Card::wait_until_unowned()`].
    ///
    /// Must be called while `guard` (this card's lock) is held, right after
    /// the card was released.
    pub(crate) fn notify_released(&self, guard: &MutexGuard<'_, CardState>) {
        debug_assert!(guard.owner.is_none());
        self.released.notify_all();
    }

    /// Blocks until nobody controls this card.
    ///
    /// The ownership check and the wait happen under the same lock that
    /// releasers hold while notifying, so a release can't slip in between.
    pub(crate) fn wait_until_unowned(&self) {
        let mut guard = self.state.lock();
        while guard.owner.is_some() {
            self.released.wait(&mut guard);
        }
    }
}

impl CardState {
    pub fn is_face_up(&self) -> bool {
        self.face_up
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn owner(&self) -> Option<&PlayerId> {
        self.owner.as_ref()
    }

    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_owned_by(&self, player: &PlayerId) -> bool {
        self.owner.as_ref() == Some(player)
    }

    /// Panics if the card is already face up.
    pub(crate) fn flip_up(&mut self) {
        assert!(!self.face_up, "flip_up() called on a face-up card");
        assert!(!self.removed, "flip_up() called on a removed card");
        self.face_up = true;
        self.check_rep();
    }

    /// Panics if the card is already face down.
    pub(crate) fn flip_down(&mut self) {
        assert!(self.face_up, "flip_down() called on a face-down card");
        assert!(self.owner.is_none(), "flip_down() called on an owned card");
        self.face_up = false;
        self.check_rep();
    }

    /// Panics if the card is owned, face down or removed.
    pub(crate) fn claim(&mut self, player: &PlayerId) {
        assert!(self.owner.is_none(), "claim() called on an owned card");
        assert!(self.face_up, "claim() called on a face-down card");
        assert!(!self.removed, "claim() called on a removed card");
        self.owner = Some(player.clone());
        self.check_rep();
    }

    /// Gives up ownership, leaving the card face up. Panics if unowned.
    pub(crate) fn release(&mut self) -> PlayerId {
        let Some(owner) = self.owner.take() else {
            panic!("release() called on an unowned card");
        };
        self.check_rep();
        owner
    }

    /// Panics if the card is owned. Removal is permanent.
    pub(crate) fn mark_removed(&mut self) {
        assert!(self.owner.is_none(), "mark_removed() called on an owned card");
        self.removed = true;
        self.check_rep();
    }

    fn check_rep(&self) {
        debug_assert!(!self.removed || self.owner.is_none());
        debug_assert!(self.owner.is_none() || self.face_up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PlayerId {
        PlayerId::from("alice")
    }

    #[test]
    fn new_card_is_face_down_and_unowned() {
        let card = Card::new(String::from("🦄"), 7);
        assert_eq!(card.index(), 7);
        assert_eq!(card.value(), "🦄");
        let state = card.snapshot();
        assert!(!state.is_face_up());
        assert!(!state.is_owned());
        assert!(!state.is_removed());
    }

    #[test]
    fn claim_and_release_keep_card_face_up() {
        let card = Card::new(String::from("A"), 0);
        let mut state = card.lock();
        state.flip_up();
        state.claim(&alice());
        assert!(state.is_owned_by(&alice()));
        assert!(!state.is_owned_by(&PlayerId::from("bob")));
        assert_eq!(state.release(), alice());
        assert!(state.is_face_up());
        assert!(!state.is_owned());
    }

    #[test]
    fn removed_card_stays_removed() {
        let card = Card::new(String::from("A"), 0);
        let mut state = card.lock();
        state.flip_up();
        state.mark_removed();
        assert!(state.is_removed());
        assert_eq!(state.owner(), None);
    }

    #[test]
    #[should_panic(expected = "flip_up() called on a face-up card")]
    fn double_flip_up_is_a_fault() {
        let mut state = CardState::default();
        state.flip_up();
        state.flip_up();
    }

    #[test]
    #[should_panic(expected = "release() called on an unowned card")]
    fn releasing_unowned_card_is_a_fault() {
        let mut state = CardState::default();
        state.flip_up();
        state.release();
    }

    #[test]
    #[should_panic(expected = "claim() called on a face-down card")]
    fn claiming_face_down_card_is_a_fault() {
        CardState::default().claim(&alice());
    }

    #[test]
    #[should_panic(expected = "mark_removed() called on an owned card")]
    fn removing_owned_card_is_a_fault() {
        let mut state = CardState::default();
        state.flip_up();
        state.claim(&alice());
        state.mark_removed();
    }

    #[test]
    fn waiter_wakes_up_after_release() {
        use std::sync::{mpsc, Arc};
        use std::time::Duration;

        let card = Arc::new(Card::new(String::from("A"), 0));
        {
            let mut state = card.lock();
            state.flip_up();
            state.claim(&alice());
        }

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let card = Arc::clone(&card);
            std::thread::spawn(move || {
                card.wait_until_unowned();
                tx.send(()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        {
            let mut state = card.lock();
            state.release();
            card.notify_released(&state);
        }
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }
}

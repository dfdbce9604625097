//! The engine of a concurrent memory game: a grid of face-down cards that
//! any number of players flip at the same time, looking for matching pairs.
//!
//! Start with [`Board`]: [`Board::player()`] resolves a player token,
//! [`Board::flip()`] plays, [`Board::render_for()`] shows the board to a
//! player and [`Board::watch()`] waits for the next change.

pub use board::*;
pub use card::*;
pub use player::*;

#[cfg(test)]
mod arbitrary;
mod board;
mod card;
mod player;

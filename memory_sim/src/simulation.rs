use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use memory::{Board, Player, Score, TurnState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::recording::Recorder;

/// The token of the player that only watches.
pub const OBSERVER: &str = "observer";

const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// How many players flip cards at the same time
    pub players: usize,
    /// How many pairs of cards each player tries to flip
    pub tries: usize,
    /// Player `i` uses the seed `seed + i`
    pub seed: u64,
}

#[derive(Debug)]
pub struct SimulationReport {
    /// In no particular order.
    pub scores: Vec<Score>,
    /// Total number of flips by all players.
    pub flips: usize,
    /// Number of board changes that reached the observer.
    pub notifications: usize,
}

/// Lets `config.players` players flip random cards on `board` concurrently,
/// while an observer watches the board.
///
/// Returns an error only if a player thread panicked.
pub fn run_simulation(
    board: &Board,
    config: &SimulationConfig,
    recorder: Option<&Recorder>,
) -> anyhow::Result<SimulationReport> {
    let done = AtomicBool::new(false);
    let (flips, notifications) = thread::scope(|s| {
        let observer = s.spawn(|| observe(board, &done));
        let players: Vec<_> = (0..config.players)
            .map(|player_idx| s.spawn(move || play(board, player_idx, config, recorder)))
            .collect();

        let mut flips = 0;
        let mut result = Ok(());
        for handle in players {
            match handle.join() {
                Ok(num_flips) => flips += num_flips,
                Err(_) => result = Err(anyhow::anyhow!("A player thread panicked")),
            }
        }
        done.store(true, Ordering::Relaxed);
        let notifications = observer.join().unwrap_or(0);
        result.map(|()| (flips, notifications))
    })?;

    Ok(SimulationReport {
        scores: board.scores(),
        flips,
        notifications,
    })
}

/// Two random flips per try, then gives up whatever is still controlled.
fn play(
    board: &Board,
    player_idx: usize,
    config: &SimulationConfig,
    recorder: Option<&Recorder>,
) -> usize {
    let player = board.player(&format!("player{}", player_idx + 1));
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(player_idx as u64));
    let mut flips = 0;

    for _ in 0..config.tries {
        for _ in 0..2 {
            let row = rng.gen_range(0..board.rows());
            let col = rng.gen_range(0..board.cols());
            flip_and_record(board, &player, row, col, recorder);
            flips += 1;
        }
    }
    flips + relinquish(board, &player, recorder)
}

/// Flips until `player` controls no cards, so that nobody is left waiting
/// on them. Returns the number of flips.
fn relinquish(board: &Board, player: &Player, recorder: Option<&Recorder>) -> usize {
    let mut flips = 0;
    loop {
        // Re-flipping the first card gives up a single card, and settles a
        // match (the card is removed by then, so nothing else happens).
        let card = match player.turn_state() {
            TurnState::OneValid(card) | TurnState::TwoMatch([card, _]) => card,
            _ => break,
        };
        debug!(player = %player.id(), card, "Giving up cards");
        flip_and_record(board, player, card / board.cols(), card % board.cols(), recorder);
        flips += 1;
    }
    flips
}

fn flip_and_record(
    board: &Board,
    player: &Player,
    row: usize,
    col: usize,
    recorder: Option<&Recorder>,
) {
    board.flip(player, row, col);
    if let Some(recorder) = recorder {
        recorder.store_flip(player.id(), row, col, board.render_for(player.id()));
    }
}

/// Keeps a watch registered until `done` is set. Returns the number of
/// changes seen.
fn observe(board: &Board, done: &AtomicBool) -> usize {
    let observer = board.player(OBSERVER);
    let mut notifications = 0;
    while !done.load(Ordering::Relaxed) {
        let (tx, rx) = mpsc::channel();
        // Re-registering after a timeout replaces the previous callback.
        board.watch(&observer, move |view| {
            let _ = tx.send(view);
        });
        if let Ok(view) = rx.recv_timeout(WATCH_POLL_INTERVAL) {
            notifications += 1;
            trace!(notifications, board = %view, "Observed board change");
        }
    }
    notifications
}

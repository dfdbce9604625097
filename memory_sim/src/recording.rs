use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use memory::{Board, PlayerId, Score};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Collects the flips of a simulation and writes them out as JSON.
pub struct Recorder {
    directory: PathBuf,
    flips: Mutex<Vec<RecordedFlip>>,
}

impl Recorder {
    pub fn new(directory: PathBuf) -> anyhow::Result<Self> {
        if !directory.is_dir() {
            anyhow::bail!("Directory '{}' does not exist", directory.display());
        }
        Ok(Self {
            directory,
            flips: Mutex::new(Vec::new()),
        })
    }

    /// Stores one flip along with the board as the flipping player saw it
    /// right afterwards.
    pub fn store_flip(&self, player: &PlayerId, row: usize, col: usize, board: String) {
        self.flips.lock().push(RecordedFlip {
            player: player.clone(),
            row,
            col,
            board,
        });
    }

    pub fn num_flips(&self) -> usize {
        self.flips.lock().len()
    }

    /// Writes `simulation_<seed>.json` into the directory and returns its path.
    pub fn write_recording(
        &self,
        seed: u64,
        board: &Board,
        scores: &[Score],
    ) -> anyhow::Result<PathBuf> {
        let filepath = self.directory.join(format!("simulation_{}.json", seed));
        let recording = SimulationRecording {
            seed,
            cards: board.to_string(),
            flips: std::mem::take(&mut *self.flips.lock()),
            scores: scores.to_vec(),
        };
        let writer = BufWriter::new(File::create(&filepath)?);
        serde_json::to_writer_pretty(writer, &recording)?;
        Ok(filepath)
    }
}

#[derive(Serialize, Deserialize)]
pub struct SimulationRecording {
    pub seed: u64,
    /// The canonical rendering, with every card's value.
    pub cards: String,
    pub flips: Vec<RecordedFlip>,
    pub scores: Vec<Score>,
}

#[derive(Serialize, Deserialize)]
pub struct RecordedFlip {
    pub player: PlayerId,
    pub row: usize,
    pub col: usize,
    pub board: String,
}

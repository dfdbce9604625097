use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use memory::Board;
use memory_sim::{run_simulation, Recorder, SimulationConfig, OBSERVER};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Path to a board file. Without it, a random board is generated
    board: Option<PathBuf>,

    /// Number of rows of the random board
    #[arg(long, default_value_t = 5)]
    rows: usize,

    /// Number of columns of the random board
    #[arg(long, default_value_t = 5)]
    cols: usize,

    /// The card values of the random board
    #[arg(long, value_delimiter = ',', default_value = "A,B,C,D,E,F")]
    values: Vec<String>,

    /// How many players flip cards at the same time
    #[arg(short, long, default_value_t = 4)]
    players: usize,

    /// How many pairs of cards each player tries to flip
    #[arg(short, long, default_value_t = 100)]
    tries: usize,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Record every flip as a JSON file into this directory
    #[arg(short, long)]
    record_to_directory: Option<PathBuf>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    // Get a random seed
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let board = if let Some(path) = &args.board {
        Board::from_file(path)
            .with_context(|| format!("Could not load the board from '{}'", path.display()))?
    } else {
        let values: BTreeSet<String> = args.values.iter().cloned().collect();
        Board::generate_random(args.rows, args.cols, &values, &mut rng)?
    };
    info!(rows = board.rows(), cols = board.cols(), "Board ready");

    let recorder = args.record_to_directory.map(Recorder::new).transpose()?;

    let config = SimulationConfig {
        players: args.players,
        tries: args.tries,
        // Keep the player seeds apart from the one used for the board
        seed: seed.wrapping_add(1),
    };
    let start = Instant::now();
    let report = run_simulation(&board, &config, recorder.as_ref())?;
    info!(
        flips = report.flips,
        notifications = report.notifications,
        elapsed = ?start.elapsed(),
        "Simulation finished"
    );

    if let Some(recorder) = &recorder {
        let path = recorder.write_recording(seed, &board, &report.scores)?;
        info!(path = %path.display(), "Wrote recording");
    }

    let mut scores = report.scores;
    scores.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.player.cmp(&b.player)));
    eprintln!("End result:");
    for score in &scores {
        eprintln!("- {}", score);
    }
    print!("{}", board.render_for(&OBSERVER.into()));

    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().event_format(format))
        .with(filter)
        .init();
}

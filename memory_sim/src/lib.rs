mod recording;
mod simulation;
pub use recording::*;
pub use simulation::*;

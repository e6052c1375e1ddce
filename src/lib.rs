//! Flappy AI: a Flappy Bird clone for the terminal.
//!
//! The simulation (`sim` and the modules under it) is pure and
//! deterministic given a seeded RNG. Rendering, sound and the end-of-run
//! commentary only read from it.

pub mod audio;
pub mod collision;
pub mod commentary;
pub mod config;
pub mod difficulty;
pub mod driver;
pub mod error;
pub mod obstacles;
pub mod phase;
pub mod physics;
pub mod render;
pub mod sim;

pub use config::{CommentaryConfig, GameConfig};
pub use error::{AppError, CommentaryError, ConfigError};
pub use phase::Phase;
pub use sim::{RunSummary, Simulation, Snapshot, SoundEvent, TickReport};

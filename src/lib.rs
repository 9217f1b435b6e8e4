pub mod engine;
pub mod error;
pub mod tui;

pub use engine::{Board, MarkOutcome, RevealResult, Visibility, DEFAULT_MINE_COUNT};
pub use error::{BoardError, Result};

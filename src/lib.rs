// Library interface for tile-groups
// This allows integration tests to access internal modules

pub mod cli;
pub mod evaluator;
pub mod game_state;
pub mod logging;
pub mod puzzle;
pub mod puzzle_bank;
pub mod service;
pub mod tui;

// Re-export commonly used items for easier testing
pub use evaluator::{MissKind, Outcome, evaluate};
pub use game_state::{Board, GameOptions, GameStatus, Session, SessionError, game_loop};
pub use puzzle::{Category, Puzzle, PuzzleError};
pub use puzzle_bank::{embedded_puzzle, load_puzzle_from_file, load_puzzle_from_str};
pub use service::{AttemptResponse, SessionStore, serve};

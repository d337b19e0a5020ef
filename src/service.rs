//! Request-handling layer: per-player sessions behind a shared puzzle.
//!
//! `SessionStore` serializes attempts per player, so two submissions for the
//! same player can never race on which category gets removed. Different
//! players only contend on the map lookup.

use crate::evaluator::{MissKind, Outcome};
use crate::game_state::{Board, GameStatus, Session, SessionError};
use crate::puzzle::{Category, Puzzle};
use crate::{debug_log, info_log};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const GAME_OVER_MESSAGE: &str = "This puzzle is finished. Reset to play again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Exact,
    NearMiss,
    Miss,
    Invalid,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolvedGroup {
    pub name: String,
    pub difficulty: u8,
    pub values: Vec<String>,
}

impl From<&Category> for SolvedGroup {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name().to_string(),
            difficulty: category.difficulty(),
            values: category.values().to_vec(),
        }
    }
}

/// Reply to a submitted attempt. Category data is only present on an exact match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResponse {
    pub success: bool,
    pub kind: ResponseKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Categories still unsolved.
    pub remaining: usize,
    pub status: GameStatus,
}

impl AttemptResponse {
    #[must_use]
    pub fn from_outcome(outcome: &Outcome, remaining: usize, status: GameStatus) -> Self {
        let kind = match outcome {
            Outcome::Exact(_) => ResponseKind::Exact,
            Outcome::NearMiss => ResponseKind::NearMiss,
            Outcome::Miss(MissKind::NoMatch) => ResponseKind::Miss,
            Outcome::Miss(MissKind::WrongCount(_)) => ResponseKind::Invalid,
        };
        let matched = match outcome {
            Outcome::Exact(category) => Some(*category),
            _ => None,
        };
        Self {
            success: matched.is_some(),
            kind,
            message: outcome.message().to_string(),
            category: matched.map(|c| c.name().to_string()),
            difficulty: matched.map(Category::difficulty),
            values: matched.map(|c| c.values().to_vec()),
            remaining,
            status,
        }
    }

    #[must_use]
    pub fn game_over(remaining: usize, status: GameStatus) -> Self {
        Self {
            success: false,
            kind: ResponseKind::GameOver,
            message: GAME_OVER_MESSAGE.to_string(),
            category: None,
            difficulty: None,
            values: None,
            remaining,
            status,
        }
    }
}

/// What a player sees when they load the puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleView {
    pub puzzle_id: String,
    /// Values of the unsolved categories, shuffled.
    pub tiles: Vec<String>,
    pub solved: Vec<SolvedGroup>,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misses_left: Option<usize>,
}

pub struct SessionStore {
    puzzle: Arc<Puzzle>,
    max_misses: Option<usize>,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore {
    #[must_use]
    pub fn new(puzzle: Arc<Puzzle>, max_misses: Option<usize>) -> Self {
        Self {
            puzzle,
            max_misses,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Session for `player`, created on first use. Entries live until `reset`;
    /// nothing evicts idle players.
    fn session(&self, player: &str) -> Arc<Mutex<Session>> {
        let mut sessions = lock(&self.sessions);
        Arc::clone(
            sessions
                .entry(player.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(self.max_misses)))),
        )
    }

    pub fn fetch<R: Rng + ?Sized>(&self, player: &str, rng: &mut R) -> PuzzleView {
        let handle = self.session(player);
        let session = lock(&handle);
        let mut board = Board::new(&self.puzzle, &session);
        board.shuffle(rng);
        PuzzleView {
            puzzle_id: self.puzzle.id().to_string(),
            tiles: board.tiles().to_vec(),
            solved: session
                .solved(&self.puzzle)
                .into_iter()
                .map(SolvedGroup::from)
                .collect(),
            status: session.status(),
            misses_left: session.misses_left(),
        }
    }

    /// Evaluate and apply an attempt while holding the player's session lock.
    pub fn submit<S: AsRef<str>>(&self, player: &str, values: &[S]) -> AttemptResponse {
        let handle = self.session(player);
        let mut session = lock(&handle);
        match session.submit(&self.puzzle, values) {
            Ok(outcome) => {
                let remaining = session.active(&self.puzzle).len();
                let response = AttemptResponse::from_outcome(&outcome, remaining, session.status());
                debug_log!("Player '{}' attempt -> {:?}", player, response.kind);
                response
            }
            Err(SessionError::GameOver(status)) => {
                debug_log!("Player '{}' attempted after game over", player);
                AttemptResponse::game_over(session.active(&self.puzzle).len(), status)
            }
        }
    }

    pub fn reset(&self, player: &str) {
        lock(&self.sessions).remove(player);
        info_log!("Session for '{}' reset", player);
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Fetch { player: String },
    Attempt { player: String, values: Vec<String> },
    Reset { player: String },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ResetResponse {
    reset: bool,
}

/// Answer newline-delimited JSON requests until the reader is exhausted.
///
/// One response line per request line. Malformed requests get an
/// `{"error": ...}` line and do not stop the loop.
///
/// # Errors
/// Only I/O failures on the reader or writer.
pub fn serve<R, W, G>(store: &SessionStore, reader: R, mut writer: W, rng: &mut G) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Request>(line) {
            Ok(Request::Fetch { player }) => {
                serde_json::to_writer(&mut writer, &store.fetch(&player, &mut *rng))?;
            }
            Ok(Request::Attempt { player, values }) => {
                serde_json::to_writer(&mut writer, &store.submit(&player, &values))?;
            }
            Ok(Request::Reset { player }) => {
                store.reset(&player);
                serde_json::to_writer(&mut writer, &ResetResponse { reset: true })?;
            }
            Err(e) => {
                debug_log!("Rejected request line: {}", e);
                let error = ErrorResponse {
                    error: format!("Invalid request: {e}"),
                };
                serde_json::to_writer(&mut writer, &error)?;
            }
        }
        writeln!(writer)?;
        writer.flush()?;
    }
    Ok(())
}

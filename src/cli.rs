use crate::evaluator::Outcome;
use crate::game_state::{GameInterface, TurnInfo, UserAction};
use crate::puzzle::{Category, GROUP_SIZE};
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use std::io::BufRead;
use std::path::PathBuf;

/// Group-the-tiles puzzle
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON puzzle definition (defaults to the built-in puzzle)
    #[arg(short = 'i', long = "input")]
    pub puzzle_path: Option<String>,

    /// Puzzle id used to key sessions (defaults to the file's id, else today's date)
    #[arg(long)]
    pub id: Option<String>,

    /// Plain line-by-line prompts instead of the full-screen board
    #[arg(long, conflicts_with = "serve")]
    pub plain: bool,

    /// Answer newline-delimited JSON requests on stdin
    #[arg(long)]
    pub serve: bool,

    /// End the game after this many wrong guesses
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_misses: Option<usize>,

    /// Seed for tile shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log file (defaults to the platform data directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

// UI Input/Output functions

#[derive(Debug, PartialEq, Eq)]
pub enum AttemptInput {
    Valid(Vec<String>),
    Invalid(String),
    Shuffle,
    Exit,
    NewGame,
}

/// Map typed tokens to tile text. Tile text wins (exact, then any case); a
/// token matching no tile may be a 1-based tile number. Anything else is
/// passed through unchanged.
fn resolve_tokens(line: &str, tiles: &[String]) -> Result<Vec<String>, String> {
    let tokens: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    tokens
        .iter()
        .map(|token| {
            let by_text = tiles
                .iter()
                .find(|tile| tile.as_str() == *token)
                .or_else(|| tiles.iter().find(|tile| tile.eq_ignore_ascii_case(token)));
            if let Some(tile) = by_text {
                return Ok(tile.clone());
            }
            if let Ok(n) = token.parse::<usize>() {
                return tiles
                    .get(n.wrapping_sub(1))
                    .cloned()
                    .ok_or_else(|| format!("There is no tile {n}."));
            }
            Ok((*token).to_string())
        })
        .collect()
}

pub fn read_attempt<R: BufRead>(reader: &mut R, tiles: &[String]) -> AttemptInput {
    println!(
        "\nEnter {GROUP_SIZE} tiles separated by commas (names or numbers), or 'shuffle', 'next', 'exit':"
    );
    let mut input = String::new();
    match reader.read_line(&mut input) {
        Ok(0) | Err(_) => return AttemptInput::Exit,
        Ok(_) => {}
    }
    let input = input.trim();

    match input.to_lowercase().as_str() {
        "exit" | "quit" => AttemptInput::Exit,
        "next" => AttemptInput::NewGame,
        "shuffle" => AttemptInput::Shuffle,
        "" => AttemptInput::Invalid("Please select some tiles.".to_string()),
        _ => match resolve_tokens(input, tiles) {
            Ok(values) => AttemptInput::Valid(values),
            Err(message) => AttemptInput::Invalid(message),
        },
    }
}

pub fn display_board(info: &TurnInfo) {
    for category in &info.solved {
        display_category(category);
    }
    println!("Tiles:");
    for (r, row) in info.tiles.chunks(GROUP_SIZE).enumerate() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(c, tile)| format!("{:>2}. {tile:<12}", r * GROUP_SIZE + c + 1))
            .collect();
        println!("  {}", cells.join(" "));
    }
    if let Some(left) = info.misses_left {
        println!("Mistakes remaining: {left}");
    }
}

pub fn display_category(category: &Category) {
    println!(
        "[{}] {}: {}",
        category.difficulty(),
        category.name(),
        category.values().join(", ")
    );
}

pub fn display_outcome(outcome: &Outcome) {
    println!("{}", outcome.message());
    if let Outcome::Exact(category) = outcome {
        display_category(category);
    }
}

pub fn display_won(attempts: usize) {
    println!("You found every group in {attempts} attempts!");
}

pub fn display_out_of_attempts(unsolved: &[&Category]) {
    println!("Out of attempts. The remaining groups were:");
    for category in unsolved {
        display_category(category);
    }
}

pub fn display_game_over_prompt() {
    println!("Game over. Type 'next' for a new game or 'exit' to quit.");
}

pub fn display_exit_message() {
    println!("Exiting.");
}

pub fn display_new_game_message(tile_count: usize) {
    println!("New game started with {tile_count} tiles.");
}

/// CLI implementation of the `GameInterface` trait
/// This struct wraps a `BufRead` reader and remembers the last board shown,
/// so tile numbers can be resolved.
pub struct CliInterface<R: BufRead> {
    reader: R,
    tiles: Vec<String>,
}

impl<R: BufRead> CliInterface<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            tiles: Vec::new(),
        }
    }
}

impl<R: BufRead> GameInterface for CliInterface<R> {
    fn display_board(&mut self, info: &TurnInfo) {
        self.tiles = info.tiles.to_vec();
        display_board(info);
    }

    fn read_action(&mut self) -> Option<UserAction> {
        match read_attempt(&mut self.reader, &self.tiles) {
            AttemptInput::Valid(values) => Some(UserAction::Submit(values)),
            AttemptInput::Shuffle => Some(UserAction::Shuffle),
            AttemptInput::Exit => Some(UserAction::Exit),
            AttemptInput::NewGame => Some(UserAction::NewGame),
            AttemptInput::Invalid(message) => {
                println!("{message}");
                None
            }
        }
    }

    fn display_outcome(&mut self, outcome: &Outcome) {
        display_outcome(outcome);
    }

    fn display_won(&mut self, attempts: usize) {
        display_won(attempts);
    }

    fn display_out_of_attempts(&mut self, unsolved: &[&Category]) {
        display_out_of_attempts(unsolved);
    }

    fn display_game_over_prompt(&mut self) {
        display_game_over_prompt();
    }

    fn display_exit_message(&mut self) {
        display_exit_message();
    }

    fn display_new_game_message(&mut self, tile_count: usize) {
        display_new_game_message(tile_count);
    }
}

use crate::puzzle::{Category, Puzzle, PuzzleError};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const EMBEDDED_PUZZLE: &str = include_str!("resources/today.json");

/// A puzzle file is either `{ "id": ..., "categories": [...] }` or a bare category list.
#[derive(Deserialize)]
#[serde(untagged)]
enum PuzzleFile {
    Full {
        #[serde(default)]
        id: Option<String>,
        categories: Vec<Category>,
    },
    Bare(Vec<Category>),
}

#[derive(Debug)]
pub enum PuzzleBankError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_json::Error),
    Invalid(PuzzleError),
}

impl fmt::Display for PuzzleBankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to read puzzle '{}': {source}", path.display())
            }
            Self::Parse(e) => write!(f, "Malformed puzzle definition: {e}"),
            Self::Invalid(e) => write!(f, "Invalid puzzle: {e}"),
        }
    }
}

impl std::error::Error for PuzzleBankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl From<PuzzleError> for PuzzleBankError {
    fn from(e: PuzzleError) -> Self {
        Self::Invalid(e)
    }
}

/// Today's local date, the id given to puzzles that do not name one.
#[must_use]
pub fn default_puzzle_id() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Parse and validate a puzzle definition.
///
/// # Errors
/// Fails on malformed JSON or on any puzzle invariant violation.
pub fn load_puzzle_from_str(data: &str) -> Result<Puzzle, PuzzleBankError> {
    let file: PuzzleFile = serde_json::from_str(data).map_err(PuzzleBankError::Parse)?;
    let (id, categories) = match file {
        PuzzleFile::Full { id, categories } => (id, categories),
        PuzzleFile::Bare(categories) => (None, categories),
    };
    let id = id.unwrap_or_else(default_puzzle_id);
    Ok(Puzzle::new(id, categories)?)
}

/// # Errors
/// Fails if the file cannot be read, or for the reasons `load_puzzle_from_str` does.
pub fn load_puzzle_from_file<P: AsRef<Path>>(path: P) -> Result<Puzzle, PuzzleBankError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| PuzzleBankError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_puzzle_from_str(&data)
}

/// # Errors
/// Only if the embedded definition has been edited into an invalid one.
pub fn embedded_puzzle() -> Result<Puzzle, PuzzleBankError> {
    load_puzzle_from_str(EMBEDDED_PUZZLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_puzzle_is_valid() {
        let puzzle = embedded_puzzle().unwrap();
        assert_eq!(puzzle.len(), 4);
        assert_eq!(puzzle.categories()[0].name(), "Fruits");
        assert_eq!(puzzle.categories()[3].name(), "Subjects");
        assert_eq!(puzzle.tiles().len(), 16);
    }

    #[test]
    fn test_missing_id_defaults_to_today() {
        let puzzle = embedded_puzzle().unwrap();
        assert_eq!(puzzle.id(), default_puzzle_id());
    }

    #[test]
    fn test_explicit_id_and_bare_list() {
        let full = r#"{"id": "fixed", "categories": [
            {"name": "A", "difficulty": 1, "values": ["a", "b", "c", "d"]}
        ]}"#;
        assert_eq!(load_puzzle_from_str(full).unwrap().id(), "fixed");

        let bare = r#"[{"name": "A", "difficulty": 1, "values": ["a", "b", "c", "d"]}]"#;
        let puzzle = load_puzzle_from_str(bare).unwrap();
        assert_eq!(puzzle.categories()[0].values(), &["a", "b", "c", "d"]);
    }

    #[test]
    fn test_invalid_puzzle_reported() {
        let data = r#"[{"name": "A", "difficulty": 1, "values": ["a", "b", "c"]}]"#;
        let err = load_puzzle_from_str(data).unwrap_err();
        assert!(matches!(
            err,
            PuzzleBankError::Invalid(PuzzleError::WrongValueCount { count: 3, .. })
        ));
    }

    #[test]
    fn test_malformed_json_reported() {
        assert!(matches!(
            load_puzzle_from_str("{not json"),
            Err(PuzzleBankError::Parse(_))
        ));
        // difficulty must be numeric
        let data = r#"[{"name": "A", "difficulty": "easy", "values": ["a", "b", "c", "d"]}]"#;
        assert!(matches!(
            load_puzzle_from_str(data),
            Err(PuzzleBankError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_reported() {
        let path = std::env::temp_dir().join("tile_groups_no_such_puzzle.json");
        let err = load_puzzle_from_file(&path).unwrap_err();
        assert!(matches!(err, PuzzleBankError::Io { .. }));
        assert!(err.to_string().contains("tile_groups_no_such_puzzle.json"));
    }
}

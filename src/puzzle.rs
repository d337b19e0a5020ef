use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Number of values every category holds.
pub const GROUP_SIZE: usize = 4;

/// A named group of four values at a fixed difficulty rank (1 = easiest).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    name: String,
    difficulty: u8,
    values: Vec<String>,
}

impl Category {
    pub fn new<S: Into<String>>(name: impl Into<String>, difficulty: u8, values: Vec<S>) -> Self {
        Self {
            name: name.into(),
            difficulty,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    /// Values in definition order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Invariant violations found while building a puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    Empty,
    BlankName,
    DuplicateCategory(String),
    InvalidDifficulty { category: String, difficulty: u8 },
    WrongValueCount { category: String, count: usize },
    BlankValue { category: String },
    DuplicateValue { value: String, first: String, second: String },
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Puzzle must contain at least one category"),
            Self::BlankName => write!(f, "Category names must not be blank"),
            Self::DuplicateCategory(name) => write!(f, "Category '{name}' is defined twice"),
            Self::InvalidDifficulty {
                category,
                difficulty,
            } => write!(
                f,
                "Category '{category}' has difficulty {difficulty}, ranks start at 1"
            ),
            Self::WrongValueCount { category, count } => write!(
                f,
                "Category '{category}' must have exactly {GROUP_SIZE} values, got {count}"
            ),
            Self::BlankValue { category } => {
                write!(f, "Category '{category}' contains a blank value")
            }
            Self::DuplicateValue {
                value,
                first,
                second,
            } => {
                if first == second {
                    write!(f, "Value '{value}' appears twice in category '{first}'")
                } else {
                    write!(
                        f,
                        "Value '{value}' appears in both '{first}' and '{second}'"
                    )
                }
            }
        }
    }
}

impl std::error::Error for PuzzleError {}

fn validate(categories: &[Category]) -> Result<(), PuzzleError> {
    if categories.is_empty() {
        return Err(PuzzleError::Empty);
    }

    let mut names = HashSet::new();
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for category in categories {
        if category.name.trim().is_empty() {
            return Err(PuzzleError::BlankName);
        }
        if !names.insert(category.name.as_str()) {
            return Err(PuzzleError::DuplicateCategory(category.name.clone()));
        }
        if category.difficulty == 0 {
            return Err(PuzzleError::InvalidDifficulty {
                category: category.name.clone(),
                difficulty: category.difficulty,
            });
        }
        if category.values.len() != GROUP_SIZE {
            return Err(PuzzleError::WrongValueCount {
                category: category.name.clone(),
                count: category.values.len(),
            });
        }
        for value in &category.values {
            if value.trim().is_empty() {
                return Err(PuzzleError::BlankValue {
                    category: category.name.clone(),
                });
            }
            if let Some(first) = owners.insert(value.as_str(), category.name.as_str()) {
                return Err(PuzzleError::DuplicateValue {
                    value: value.clone(),
                    first: first.to_string(),
                    second: category.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// One day's puzzle. Categories are kept in evaluation order: ascending
/// difficulty, ties in definition order. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    id: String,
    categories: Vec<Category>,
}

impl Puzzle {
    /// Validate and build a puzzle.
    ///
    /// # Errors
    /// Returns the first `PuzzleError` found. A puzzle that fails here must not be served:
    /// the evaluator relies on every value belonging to exactly one category.
    pub fn new(id: impl Into<String>, mut categories: Vec<Category>) -> Result<Self, PuzzleError> {
        validate(&categories)?;

        // Stable: equal ranks keep definition order.
        categories.sort_by_key(Category::difficulty);

        Ok(Self {
            id: id.into(),
            categories,
        })
    }

    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Every value on the board, grouped by category in evaluation order.
    #[must_use]
    pub fn tiles(&self) -> Vec<&str> {
        self.categories
            .iter()
            .flat_map(|c| c.values.iter().map(String::as_str))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruits() -> Category {
        Category::new("Fruits", 1, vec!["Apple", "Banana", "Cherry", "Date"])
    }

    fn animals() -> Category {
        Category::new("Animals", 2, vec!["Elephant", "Frog", "Giraffe", "Horse"])
    }

    #[test]
    fn test_valid_puzzle() {
        let puzzle = Puzzle::new("day-1", vec![fruits(), animals()]).unwrap();
        assert_eq!(puzzle.id(), "day-1");
        assert_eq!(puzzle.len(), 2);
        assert_eq!(puzzle.tiles().len(), 8);
        assert!(puzzle.category("Fruits").unwrap().contains("Cherry"));
        assert!(puzzle.category("Vegetables").is_none());
    }

    #[test]
    fn test_categories_sorted_by_difficulty() {
        let puzzle = Puzzle::new("day-1", vec![animals(), fruits()]).unwrap();
        let names: Vec<&str> = puzzle.categories().iter().map(Category::name).collect();
        assert_eq!(names, vec!["Fruits", "Animals"]);
    }

    #[test]
    fn test_equal_difficulty_keeps_definition_order() {
        let a = Category::new("Zeta", 2, vec!["a", "b", "c", "d"]);
        let b = Category::new("Alpha", 2, vec!["e", "f", "g", "h"]);
        let easy = Category::new("Easy", 1, vec!["i", "j", "k", "l"]);
        let puzzle = Puzzle::new("ties", vec![a, b, easy]).unwrap();
        let names: Vec<&str> = puzzle.categories().iter().map(Category::name).collect();
        assert_eq!(names, vec!["Easy", "Zeta", "Alpha"]);
    }

    #[test]
    fn test_empty_puzzle_rejected() {
        assert_eq!(Puzzle::new("x", vec![]), Err(PuzzleError::Empty));
    }

    #[test]
    fn test_wrong_value_count_rejected() {
        let short = Category::new("Short", 1, vec!["a", "b", "c"]);
        assert_eq!(
            Puzzle::new("x", vec![short]),
            Err(PuzzleError::WrongValueCount {
                category: "Short".to_string(),
                count: 3
            })
        );

        let long = Category::new("Long", 1, vec!["a", "b", "c", "d", "e"]);
        assert!(matches!(
            Puzzle::new("x", vec![long]),
            Err(PuzzleError::WrongValueCount { count: 5, .. })
        ));
    }

    #[test]
    fn test_value_shared_between_categories_rejected() {
        let trees = Category::new("Trees", 3, vec!["Oak", "Pine", "Date", "Elm"]);
        let err = Puzzle::new("x", vec![fruits(), trees]).unwrap_err();
        assert_eq!(
            err,
            PuzzleError::DuplicateValue {
                value: "Date".to_string(),
                first: "Fruits".to_string(),
                second: "Trees".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Value 'Date' appears in both 'Fruits' and 'Trees'"
        );
    }

    #[test]
    fn test_value_repeated_within_category_rejected() {
        let repeated = Category::new("Echo", 1, vec!["a", "b", "a", "c"]);
        let err = Puzzle::new("x", vec![repeated]).unwrap_err();
        assert_eq!(err.to_string(), "Value 'a' appears twice in category 'Echo'");
    }

    #[test]
    fn test_duplicate_category_name_rejected() {
        let again = Category::new("Fruits", 2, vec!["Fig", "Grape", "Kiwi", "Lime"]);
        assert_eq!(
            Puzzle::new("x", vec![fruits(), again]),
            Err(PuzzleError::DuplicateCategory("Fruits".to_string()))
        );
    }

    #[test]
    fn test_zero_difficulty_rejected() {
        let zero = Category::new("Zero", 0, vec!["a", "b", "c", "d"]);
        assert!(matches!(
            Puzzle::new("x", vec![zero]),
            Err(PuzzleError::InvalidDifficulty { difficulty: 0, .. })
        ));
    }

    #[test]
    fn test_blank_name_and_value_rejected() {
        let unnamed = Category::new("  ", 1, vec!["a", "b", "c", "d"]);
        assert_eq!(Puzzle::new("x", vec![unnamed]), Err(PuzzleError::BlankName));

        let blank = Category::new("Blank", 1, vec!["a", "", "c", "d"]);
        assert_eq!(
            Puzzle::new("x", vec![blank]),
            Err(PuzzleError::BlankValue {
                category: "Blank".to_string()
            })
        );
    }
}

use crate::puzzle::{Category, GROUP_SIZE};
use std::collections::HashSet;

pub const CORRECT_MESSAGE: &str = "Correct! You found a group.";
pub const NEAR_MISS_MESSAGE: &str = "Super close, you have 3 correct. Keep trying!";
pub const MISS_MESSAGE: &str = "Not quite. Try again!";
pub const WRONG_COUNT_MESSAGE: &str = "You must choose four values";

/// Why an attempt missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissKind {
    /// The attempt did not hold four distinct values; carries the distinct count.
    WrongCount(usize),
    /// Four distinct values, but fewer than three from any one category.
    NoMatch,
}

/// Result of evaluating one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    Exact(&'a Category),
    /// Three of four values share a category. Which one is never disclosed.
    NearMiss,
    Miss(MissKind),
}

impl Outcome<'_> {
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Exact(_) => CORRECT_MESSAGE,
            Self::NearMiss => NEAR_MISS_MESSAGE,
            Self::Miss(MissKind::WrongCount(_)) => WRONG_COUNT_MESSAGE,
            Self::Miss(MissKind::NoMatch) => MISS_MESSAGE,
        }
    }

    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// True for attempts rejected before any category was compared.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Miss(MissKind::WrongCount(_)))
    }
}

/// Collapse duplicates in a submitted attempt.
pub fn distinct_values<S: AsRef<str>>(submitted: &[S]) -> HashSet<&str> {
    submitted.iter().map(|s| s.as_ref()).collect()
}

/// Classify an attempt against the categories still in play.
///
/// Categories are scanned in ascending difficulty, ties in the order given, and the
/// first one with a 4-value or 3-value overlap decides the outcome. Nothing is mutated;
/// the caller applies the outcome to its own state.
pub fn evaluate<'a, S: AsRef<str>>(active: &[&'a Category], submitted: &[S]) -> Outcome<'a> {
    let attempt = distinct_values(submitted);
    if attempt.len() != GROUP_SIZE {
        return Outcome::Miss(MissKind::WrongCount(attempt.len()));
    }

    let mut ordered = active.to_vec();
    ordered.sort_by_key(|c| c.difficulty());

    for category in ordered {
        match overlap(category, &attempt) {
            GROUP_SIZE => return Outcome::Exact(category),
            n if n == GROUP_SIZE - 1 => return Outcome::NearMiss,
            _ => {}
        }
    }
    Outcome::Miss(MissKind::NoMatch)
}

fn overlap(category: &Category, attempt: &HashSet<&str>) -> usize {
    category
        .values()
        .iter()
        .filter(|v| attempt.contains(v.as_str()))
        .count()
}

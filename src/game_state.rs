use crate::evaluator::{MissKind, Outcome, evaluate};
use crate::info_log;
use crate::puzzle::{Category, Puzzle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Playing,
    Won,
    /// The session's miss cap was reached. Only reachable when a cap is configured.
    OutOfAttempts,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "playing"),
            Self::Won => write!(f, "won"),
            Self::OutOfAttempts => write!(f, "out of attempts"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    GameOver(GameStatus),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver(status) => write!(f, "The game is over ({status})"),
        }
    }
}

impl std::error::Error for SessionError {}

/// One player's progress through one puzzle.
///
/// The puzzle itself is never touched: the session records which categories
/// have been solved and derives the active set from that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    solved: Vec<String>,
    attempts: usize,
    misses: usize,
    max_misses: Option<usize>,
    status: GameStatus,
}

impl Session {
    #[must_use]
    pub fn new(max_misses: Option<usize>) -> Self {
        Self {
            max_misses,
            ..Self::default()
        }
    }

    /// Unsolved categories in evaluation order.
    #[must_use]
    pub fn active<'a>(&self, puzzle: &'a Puzzle) -> Vec<&'a Category> {
        puzzle
            .categories()
            .iter()
            .filter(|c| !self.is_solved(c.name()))
            .collect()
    }

    /// Solved categories, easiest first.
    #[must_use]
    pub fn solved<'a>(&self, puzzle: &'a Puzzle) -> Vec<&'a Category> {
        puzzle
            .categories()
            .iter()
            .filter(|c| self.is_solved(c.name()))
            .collect()
    }

    /// Names of solved categories in the order they were found.
    #[must_use]
    pub fn solved_names(&self) -> &[String] {
        &self.solved
    }

    #[must_use]
    pub fn is_solved(&self, name: &str) -> bool {
        self.solved.iter().any(|s| s == name)
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Evaluated attempts, validation failures excluded.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses
    }

    #[must_use]
    pub fn misses_left(&self) -> Option<usize> {
        self.max_misses.map(|max| max.saturating_sub(self.misses))
    }

    /// Evaluate an attempt against the active categories and apply the result.
    ///
    /// # Errors
    /// Returns `SessionError::GameOver` once the session has left `Playing`;
    /// the attempt is not evaluated.
    pub fn submit<'a, S: AsRef<str>>(
        &mut self,
        puzzle: &'a Puzzle,
        values: &[S],
    ) -> Result<Outcome<'a>, SessionError> {
        if self.status != GameStatus::Playing {
            return Err(SessionError::GameOver(self.status));
        }
        let outcome = evaluate(&self.active(puzzle), values);
        self.apply(puzzle, &outcome);
        Ok(outcome)
    }

    /// Apply an evaluator outcome to this session. Ignored once the game is over.
    pub fn apply(&mut self, puzzle: &Puzzle, outcome: &Outcome) {
        if self.status != GameStatus::Playing {
            return;
        }
        match outcome {
            Outcome::Miss(MissKind::WrongCount(_)) => return,
            Outcome::Exact(category) => {
                if !self.is_solved(category.name()) {
                    self.solved.push(category.name().to_string());
                }
                info_log!(
                    "Solved '{}' ({}/{})",
                    category.name(),
                    self.solved.len(),
                    puzzle.len()
                );
            }
            Outcome::NearMiss | Outcome::Miss(MissKind::NoMatch) => self.misses += 1,
        }
        self.attempts += 1;

        if self.active(puzzle).is_empty() {
            self.status = GameStatus::Won;
            info_log!("Puzzle '{}' won in {} attempts", puzzle.id(), self.attempts);
        } else if self.max_misses.is_some_and(|max| self.misses >= max) {
            self.status = GameStatus::OutOfAttempts;
            info_log!("Puzzle '{}' lost after {} misses", puzzle.id(), self.misses);
        }
    }
}

/// Display order of the tiles still in play. Shuffling is cosmetic and never
/// affects evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: Vec<String>,
}

impl Board {
    #[must_use]
    pub fn new(puzzle: &Puzzle, session: &Session) -> Self {
        let tiles = session
            .active(puzzle)
            .iter()
            .flat_map(|c| c.values().iter().cloned())
            .collect();
        Self { tiles }
    }

    #[must_use]
    pub fn tiles(&self) -> &[String] {
        &self.tiles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tiles.shuffle(rng);
    }

    /// Drop a solved category's values, leaving every other tile in place.
    pub fn remove_category(&mut self, category: &Category) {
        self.tiles.retain(|t| !category.contains(t));
    }
}

/// What a front end asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Submit(Vec<String>),
    Shuffle,
    NewGame,
    Exit,
}

/// Snapshot handed to the front end before each read.
#[derive(Debug, Clone)]
pub struct TurnInfo<'a> {
    pub tiles: &'a [String],
    pub solved: Vec<&'a Category>,
    pub misses_left: Option<usize>,
}

/// Settings shared by every game in one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameOptions {
    pub max_misses: Option<usize>,
    /// Fixed seed for display shuffling; random when absent.
    pub seed: Option<u64>,
}

impl GameOptions {
    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Front-end seam: the game loop only talks to players through this trait.
pub trait GameInterface {
    fn display_board(&mut self, info: &TurnInfo);
    /// `None` means the input was unusable and the player should be asked again.
    fn read_action(&mut self) -> Option<UserAction>;
    fn display_outcome(&mut self, outcome: &Outcome);
    fn display_won(&mut self, attempts: usize);
    fn display_out_of_attempts(&mut self, unsolved: &[&Category]);
    fn display_game_over_prompt(&mut self);
    fn display_exit_message(&mut self);
    fn display_new_game_message(&mut self, tile_count: usize);
}

fn turn_info<'a>(puzzle: &'a Puzzle, session: &Session, board: &'a Board) -> TurnInfo<'a> {
    TurnInfo {
        tiles: board.tiles(),
        solved: session.solved(puzzle),
        misses_left: session.misses_left(),
    }
}

fn new_game(puzzle: &Puzzle, options: &GameOptions, rng: &mut StdRng) -> (Session, Board) {
    let session = Session::new(options.max_misses);
    let mut board = Board::new(puzzle, &session);
    board.shuffle(rng);
    (session, board)
}

/// Play `puzzle` until the player exits. Returns the status of the last game.
pub fn game_loop<I: GameInterface>(
    puzzle: &Puzzle,
    options: &GameOptions,
    interface: &mut I,
) -> GameStatus {
    let mut rng = options.rng();
    let (mut session, mut board) = new_game(puzzle, options, &mut rng);
    info_log!(
        "Starting puzzle '{}' with {} tiles",
        puzzle.id(),
        board.len()
    );

    loop {
        if session.status() == GameStatus::Playing {
            interface.display_board(&turn_info(puzzle, &session, &board));
        } else {
            interface.display_game_over_prompt();
        }

        let Some(action) = interface.read_action() else {
            continue;
        };

        match action {
            UserAction::Exit => {
                interface.display_exit_message();
                break;
            }
            UserAction::NewGame => {
                (session, board) = new_game(puzzle, options, &mut rng);
                interface.display_new_game_message(board.len());
            }
            UserAction::Shuffle if session.status() == GameStatus::Playing => {
                board.shuffle(&mut rng);
            }
            UserAction::Submit(values) if session.status() == GameStatus::Playing => {
                let Ok(outcome) = session.submit(puzzle, &values) else {
                    continue;
                };
                interface.display_outcome(&outcome);
                if let Outcome::Exact(category) = outcome {
                    board.remove_category(category);
                    board.shuffle(&mut rng);
                }
                match session.status() {
                    GameStatus::Playing => {}
                    GameStatus::Won => interface.display_won(session.attempts()),
                    GameStatus::OutOfAttempts => {
                        interface.display_out_of_attempts(&session.active(puzzle));
                    }
                }
            }
            UserAction::Shuffle | UserAction::Submit(_) => {}
        }
    }
    session.status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle_bank::embedded_puzzle;
    use std::collections::VecDeque;

    fn fruits() -> Vec<String> {
        ["Apple", "Banana", "Cherry", "Date"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn group(puzzle: &Puzzle, name: &str) -> Vec<String> {
        puzzle.category(name).unwrap().values().to_vec()
    }

    #[test]
    fn test_new_session_is_playing_with_all_active() {
        let puzzle = embedded_puzzle().unwrap();
        let session = Session::new(None);
        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.active(&puzzle).len(), 4);
        assert!(session.solved(&puzzle).is_empty());
        assert_eq!(session.misses_left(), None);
    }

    #[test]
    fn test_exact_removes_only_that_category() {
        let puzzle = embedded_puzzle().unwrap();
        let mut session = Session::new(None);
        let mut board = Board::new(&puzzle, &session);

        let outcome = session.submit(&puzzle, &fruits()).unwrap();
        let Outcome::Exact(category) = outcome else {
            panic!("expected exact match, got {outcome:?}");
        };
        board.remove_category(category);

        assert_eq!(board.len(), 12);
        for value in fruits() {
            assert!(!board.tiles().contains(&value));
        }
        for other in ["Animals", "Countries", "Subjects"] {
            for value in group(&puzzle, other) {
                assert!(board.tiles().contains(&value));
            }
        }
        assert_eq!(Board::new(&puzzle, &session), board);
        assert_eq!(session.solved_names(), &["Fruits".to_string()]);
        assert_eq!(session.status(), GameStatus::Playing);
    }

    #[test]
    fn test_solving_every_category_wins() {
        let puzzle = embedded_puzzle().unwrap();
        let mut session = Session::new(None);
        for name in ["Subjects", "Fruits", "Countries", "Animals"] {
            assert_eq!(session.status(), GameStatus::Playing);
            let outcome = session.submit(&puzzle, &group(&puzzle, name)).unwrap();
            assert!(outcome.is_exact());
        }
        assert_eq!(session.status(), GameStatus::Won);
        assert_eq!(session.attempts(), 4);
        assert!(session.active(&puzzle).is_empty());
        assert!(Board::new(&puzzle, &session).is_empty());

        let solved: Vec<&str> = session.solved(&puzzle).iter().map(|c| c.name()).collect();
        assert_eq!(solved, vec!["Fruits", "Animals", "Countries", "Subjects"]);
        assert_eq!(session.solved_names()[0], "Subjects");
    }

    #[test]
    fn test_no_attempts_after_win() {
        let puzzle = embedded_puzzle().unwrap();
        let mut session = Session::new(None);
        for category in puzzle.categories() {
            session.submit(&puzzle, category.values()).unwrap();
        }
        assert_eq!(
            session.submit(&puzzle, &fruits()),
            Err(SessionError::GameOver(GameStatus::Won))
        );
        assert_eq!(session.attempts(), 4);
    }

    #[test]
    fn test_apply_ignored_after_game_over() {
        let puzzle = embedded_puzzle().unwrap();
        let mut session = Session::new(Some(1));
        session
            .submit(&puzzle, &["Apple", "Banana", "Frog", "Horse"])
            .unwrap();
        assert_eq!(session.status(), GameStatus::OutOfAttempts);

        session.apply(&puzzle, &Outcome::NearMiss);
        session.apply(&puzzle, &Outcome::Exact(&puzzle.categories()[0]));
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.misses(), 1);
        assert!(session.solved(&puzzle).is_empty());
        assert_eq!(session.status(), GameStatus::OutOfAttempts);
    }

    #[test]
    fn test_misses_leave_state_unchanged() {
        let puzzle = embedded_puzzle().unwrap();
        let mut session = Session::new(None);
        let before = Board::new(&puzzle, &session);

        let near = session
            .submit(&puzzle, &["Apple", "Banana", "Cherry", "Frog"])
            .unwrap();
        assert_eq!(near, Outcome::NearMiss);
        let miss = session
            .submit(&puzzle, &["Apple", "Banana", "Frog", "Horse"])
            .unwrap();
        assert_eq!(miss, Outcome::Miss(MissKind::NoMatch));

        assert_eq!(session.misses(), 2);
        assert_eq!(session.active(&puzzle).len(), 4);
        assert_eq!(Board::new(&puzzle, &session), before);
    }

    #[test]
    fn test_invalid_attempt_is_not_counted() {
        let puzzle = embedded_puzzle().unwrap();
        let mut session = Session::new(Some(1));
        let outcome = session
            .submit(&puzzle, &["Apple", "Apple", "Banana", "Cherry"])
            .unwrap();
        assert!(outcome.is_invalid());
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.misses(), 0);
        assert_eq!(session.status(), GameStatus::Playing);
    }

    #[test]
    fn test_miss_cap_ends_game() {
        let puzzle = embedded_puzzle().unwrap();
        let mut session = Session::new(Some(2));
        session
            .submit(&puzzle, &["Apple", "Banana", "Frog", "Horse"])
            .unwrap();
        assert_eq!(session.misses_left(), Some(1));
        session
            .submit(&puzzle, &["Apple", "Banana", "Cherry", "Frog"])
            .unwrap();
        assert_eq!(session.status(), GameStatus::OutOfAttempts);
        assert_eq!(session.misses_left(), Some(0));
        assert_eq!(
            session.submit(&puzzle, &fruits()),
            Err(SessionError::GameOver(GameStatus::OutOfAttempts))
        );
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let puzzle = embedded_puzzle().unwrap();
        let session = Session::new(None);
        let mut a = Board::new(&puzzle, &session);
        let mut b = a.clone();
        a.shuffle(&mut StdRng::seed_from_u64(7));
        b.shuffle(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let mut sorted = a.tiles().to_vec();
        sorted.sort();
        let mut expected: Vec<String> = puzzle.tiles().iter().map(ToString::to_string).collect();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[derive(Default)]
    struct ScriptedInterface {
        actions: VecDeque<UserAction>,
        outcomes: Vec<String>,
        boards: Vec<usize>,
        won: Option<usize>,
        revealed: Vec<String>,
        new_games: usize,
        exited: bool,
    }

    impl ScriptedInterface {
        fn new(actions: Vec<UserAction>) -> Self {
            Self {
                actions: actions.into(),
                ..Self::default()
            }
        }
    }

    impl GameInterface for ScriptedInterface {
        fn display_board(&mut self, info: &TurnInfo) {
            self.boards.push(info.tiles.len());
        }

        fn read_action(&mut self) -> Option<UserAction> {
            Some(self.actions.pop_front().unwrap_or(UserAction::Exit))
        }

        fn display_outcome(&mut self, outcome: &Outcome) {
            self.outcomes.push(outcome.message().to_string());
        }

        fn display_won(&mut self, attempts: usize) {
            self.won = Some(attempts);
        }

        fn display_out_of_attempts(&mut self, unsolved: &[&Category]) {
            self.revealed = unsolved.iter().map(|c| c.name().to_string()).collect();
        }

        fn display_game_over_prompt(&mut self) {}

        fn display_exit_message(&mut self) {
            self.exited = true;
        }

        fn display_new_game_message(&mut self, _tile_count: usize) {
            self.new_games += 1;
        }
    }

    fn submit(values: &[&str]) -> UserAction {
        UserAction::Submit(values.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_game_loop_plays_to_win() {
        let puzzle = embedded_puzzle().unwrap();
        let mut actions = vec![
            submit(&["Apple", "Banana", "Cherry", "Frog"]),
            UserAction::Shuffle,
        ];
        actions.extend(
            puzzle
                .categories()
                .iter()
                .map(|c| UserAction::Submit(c.values().to_vec())),
        );
        let mut interface = ScriptedInterface::new(actions);
        let options = GameOptions {
            max_misses: None,
            seed: Some(1),
        };

        let status = game_loop(&puzzle, &options, &mut interface);

        assert_eq!(status, GameStatus::Won);
        assert_eq!(interface.won, Some(5));
        assert_eq!(interface.outcomes.len(), 5);
        assert_eq!(interface.outcomes[0], crate::evaluator::NEAR_MISS_MESSAGE);
        assert_eq!(interface.boards, vec![16, 16, 16, 12, 8, 4]);
        assert!(interface.exited);
    }

    #[test]
    fn test_game_loop_reveals_on_miss_cap_and_restarts() {
        let puzzle = embedded_puzzle().unwrap();
        let actions = vec![
            submit(&["Apple", "Banana", "Cherry", "Date"]),
            submit(&["Apple", "Frog", "India", "Math"]),
            submit(&["Elephant", "Frog", "Giraffe", "India"]),
            submit(&["Elephant", "Frog", "Giraffe", "Horse"]),
            UserAction::NewGame,
        ];
        let mut interface = ScriptedInterface::new(actions);
        let options = GameOptions {
            max_misses: Some(2),
            seed: Some(3),
        };

        let status = game_loop(&puzzle, &options, &mut interface);

        assert_eq!(interface.revealed, vec!["Animals", "Countries", "Subjects"]);
        // The attempt after the cap is ignored.
        assert_eq!(interface.outcomes.len(), 3);
        assert_eq!(interface.new_games, 1);
        assert_eq!(status, GameStatus::Playing);
    }
}

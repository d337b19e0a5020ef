use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io;
use std::sync::Arc;
use tile_groups::cli::{CliInterface, parse_cli};
use tile_groups::logging::{default_log_path, init_file_logger};
use tile_groups::tui::TuiInterface;
use tile_groups::{
    GameOptions, Puzzle, SessionStore, embedded_puzzle, game_loop, info_log, load_puzzle_from_file,
    serve,
};

fn load_puzzle(path: Option<&str>, id: Option<String>) -> Result<Puzzle> {
    let puzzle = match path {
        Some(path) => load_puzzle_from_file(path)
            .with_context(|| format!("Failed to load puzzle from '{path}'"))?,
        None => embedded_puzzle().context("Built-in puzzle is invalid")?,
    };
    Ok(match id {
        Some(id) => puzzle.with_id(id),
        None => puzzle,
    })
}

fn main() -> Result<()> {
    let cli = parse_cli();

    if let Some(log_path) = cli.log_file.clone().or_else(default_log_path) {
        init_file_logger(&log_path)
            .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;
    }

    let puzzle = load_puzzle(cli.puzzle_path.as_deref(), cli.id.clone())?;
    info_log!(
        "Loaded puzzle '{}' with {} categories",
        puzzle.id(),
        puzzle.len()
    );

    if cli.serve {
        let store = SessionStore::new(Arc::new(puzzle), cli.max_misses);
        let mut rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let stdin = io::stdin();
        serve(&store, stdin.lock(), io::stdout().lock(), &mut rng)
            .context("JSON request loop failed")?;
        return Ok(());
    }

    let options = GameOptions {
        max_misses: cli.max_misses,
        seed: cli.seed,
    };

    if cli.plain {
        let stdin = io::stdin();
        let mut interface = CliInterface::new(stdin.lock());
        game_loop(&puzzle, &options, &mut interface);
    } else {
        let mut interface = TuiInterface::new().context("Failed to initialize terminal")?;
        game_loop(&puzzle, &options, &mut interface);
    }
    Ok(())
}

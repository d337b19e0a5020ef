//! TUI (Terminal User Interface) module for the tile puzzle
//!
//! This module provides an interactive terminal interface using Ratatui.
//!
//! # Architecture
//! - `TuiModel`: everything the screen shows plus key handling, no terminal access
//! - `TuiInterface`: owns the terminal, renders the model, implements `GameInterface`
//!
//! # State Machine
//! - `Selecting` → (game won or out of attempts) → `GameOver` → (N) → `Selecting`

use crate::evaluator::{MissKind, Outcome};
use crate::game_state::{GameInterface, TurnInfo, UserAction};
use crate::puzzle::{Category, GROUP_SIZE};
use crate::{debug_log, info_log};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;

const COLUMNS: usize = GROUP_SIZE;
const TILE_HEIGHT: u16 = 3;
const EVENT_POLL_TIMEOUT_MS: u64 = 100;
const ASCII_CONTROL_CHAR_THRESHOLD: u32 = 32;

// Style constants for consistent UI
const HEADER_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const ERROR_STYLE: Style = Style::new().fg(Color::Red);
const SUCCESS_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
const INFO_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const MESSAGE_STYLE: Style = Style::new().fg(Color::Cyan);
const TILE_STYLE: Style = Style::new().fg(Color::White);
const SELECTED_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Gray)
    .add_modifier(Modifier::BOLD);
const CURSOR_BORDER_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);

/// Group colour by difficulty: yellow, green, blue, purple.
fn difficulty_color(difficulty: u8) -> Color {
    match difficulty {
        1 => Color::Yellow,
        3 => Color::Blue,
        4 => Color::Magenta,
        _ => Color::Green,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TuiState {
    Selecting,
    /// Won or out of attempts - message stored in `message`
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupRow {
    name: String,
    difficulty: u8,
    values: Vec<String>,
}

impl From<&Category> for GroupRow {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name().to_string(),
            difficulty: category.difficulty(),
            values: category.values().to_vec(),
        }
    }
}

/// Tiles in display order plus cursor and selection. Selection is kept by
/// value so a reshuffle does not lose it.
#[derive(Debug, Default)]
struct TileGrid {
    tiles: Vec<String>,
    cursor: usize,
    selected: Vec<String>,
}

impl TileGrid {
    fn set_tiles(&mut self, tiles: &[String]) {
        self.tiles = tiles.to_vec();
        self.selected.retain(|v| tiles.contains(v));
        self.cursor = self.cursor.min(self.tiles.len().saturating_sub(1));
    }

    fn is_selected(&self, tile: &str) -> bool {
        self.selected.iter().any(|s| s == tile)
    }

    fn toggle(&mut self) {
        let Some(tile) = self.tiles.get(self.cursor) else {
            return;
        };
        if let Some(pos) = self.selected.iter().position(|s| s == tile) {
            self.selected.remove(pos);
        } else {
            self.selected.push(tile.clone());
        }
    }

    fn clear(&mut self) {
        self.selected.clear();
    }

    fn move_left(&mut self) {
        if self.cursor % COLUMNS > 0 {
            self.cursor -= 1;
        }
    }

    fn move_right(&mut self) {
        if (self.cursor + 1) % COLUMNS != 0 && self.cursor + 1 < self.tiles.len() {
            self.cursor += 1;
        }
    }

    fn move_up(&mut self) {
        if self.cursor >= COLUMNS {
            self.cursor -= COLUMNS;
        }
    }

    fn move_down(&mut self) {
        if self.cursor + COLUMNS < self.tiles.len() {
            self.cursor += COLUMNS;
        }
    }
}

/// Screen state and key handling, independent of the terminal.
#[derive(Debug)]
struct TuiModel {
    state: TuiState,
    grid: TileGrid,
    solved: Vec<GroupRow>,
    revealed: Vec<GroupRow>,
    misses_left: Option<usize>,
    message: String,
    message_kind: MessageKind,
    status: String,
}

impl TuiModel {
    fn new() -> Self {
        Self {
            state: TuiState::Selecting,
            grid: TileGrid::default(),
            solved: Vec::new(),
            revealed: Vec::new(),
            misses_left: None,
            message: String::new(),
            message_kind: MessageKind::Info,
            status: "Ready".to_string(),
        }
    }

    fn set_message(&mut self, message: impl Into<String>, kind: MessageKind) {
        self.message = message.into();
        self.message_kind = kind;
    }

    fn update_board(&mut self, info: &TurnInfo) {
        self.state = TuiState::Selecting;
        self.grid.set_tiles(info.tiles);
        self.solved = info.solved.iter().map(|c| GroupRow::from(*c)).collect();
        self.misses_left = info.misses_left;
        self.status = match info.misses_left {
            Some(left) => format!("{} tiles left | Mistakes remaining: {left}", info.tiles.len()),
            None => format!("{} tiles left", info.tiles.len()),
        };
    }

    fn apply_outcome(&mut self, outcome: &Outcome) {
        let kind = match outcome {
            Outcome::Exact(_) => MessageKind::Success,
            Outcome::NearMiss => MessageKind::Info,
            Outcome::Miss(MissKind::NoMatch | MissKind::WrongCount(_)) => MessageKind::Error,
        };
        let message = match outcome {
            Outcome::Exact(category) => format!("{} {}", outcome.message(), category.name()),
            _ => outcome.message().to_string(),
        };
        self.set_message(message, kind);
        self.grid.clear();
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        if key.modifiers.contains(KeyModifiers::ALT) || key.modifiers.contains(KeyModifiers::CONTROL)
        {
            debug_log!("handle_key() - Ignoring key with modifier: {:?}", key.modifiers);
            return None;
        }
        match self.state {
            TuiState::Selecting => self.handle_selecting_key(key),
            TuiState::GameOver => Self::handle_game_over_key(key),
        }
    }

    fn handle_selecting_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        match key.code {
            KeyCode::Esc => return Some(UserAction::Exit),
            KeyCode::Left | KeyCode::Char('h') => self.grid.move_left(),
            KeyCode::Right | KeyCode::Char('l') => self.grid.move_right(),
            KeyCode::Up | KeyCode::Char('k') => self.grid.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.grid.move_down(),
            KeyCode::Char(' ') => {
                self.grid.toggle();
                self.message.clear();
            }
            KeyCode::Char('d' | 'D') => self.grid.clear(),
            KeyCode::Char('s' | 'S') => return Some(UserAction::Shuffle),
            KeyCode::Enter if self.grid.selected.is_empty() => {
                self.set_message("Select some tiles first!", MessageKind::Error);
            }
            KeyCode::Enter => {
                let values = self.grid.selected.clone();
                info_log!("handle_selecting_key() - Submitting {} tiles", values.len());
                return Some(UserAction::Submit(values));
            }
            _ => {
                debug_log!("handle_selecting_key() - Ignoring key: {:?}", key.code);
            }
        }
        None
    }

    fn handle_game_over_key(key: KeyEvent) -> Option<UserAction> {
        match key.code {
            KeyCode::Char('n' | 'N') => Some(UserAction::NewGame),
            KeyCode::Esc => Some(UserAction::Exit),
            _ => None,
        }
    }
}

/// Main TUI interface component.
///
/// Manages terminal rendering and input handling.
pub struct TuiInterface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    model: TuiModel,
}

impl TuiInterface {
    pub fn new() -> Result<Self, io::Error> {
        info_log!("TuiInterface::new() - Initializing TUI");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        info_log!("Terminal setup complete");

        Ok(Self {
            terminal,
            model: TuiModel::new(),
        })
    }

    pub fn cleanup(&mut self) -> Result<(), io::Error> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }

    fn draw(&mut self) -> Result<(), io::Error> {
        let model = &self.model;
        self.terminal.draw(|f| render(f, model))?;
        Ok(())
    }

    fn draw_or_log(&mut self) {
        if let Err(e) = self.draw() {
            debug_log!("Draw error: {}", e);
        }
    }

    fn next_key(&mut self) -> Result<Option<KeyEvent>, io::Error> {
        if !event::poll(std::time::Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            return Ok(None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(None);
        };
        // Only Press events; Release and Repeat would double the input
        if key.kind != event::KeyEventKind::Press {
            return Ok(None);
        }
        // Garbage from terminal focus escape sequences (alt-tab)
        if let KeyCode::Char(c) = key.code
            && (c == '\u{FFFD}' || (c as u32) < ASCII_CONTROL_CHAR_THRESHOLD)
        {
            debug_log!("next_key() - Ignoring invalid character: {:?}", c);
            return Ok(None);
        }
        Ok(Some(key))
    }
}

impl Drop for TuiInterface {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn render(f: &mut Frame, model: &TuiModel) {
    let group_lines = (model.solved.len() + model.revealed.len()).max(1);
    let tile_rows = model.grid.tiles.len().div_ceil(COLUMNS).max(1);
    #[allow(clippy::cast_possible_truncation)]
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                  // Title
            Constraint::Length(group_lines as u16 + 2),             // Solved groups
            Constraint::Length(tile_rows as u16 * TILE_HEIGHT + 2), // Board
            Constraint::Min(3),                                     // Message
            Constraint::Length(3),                                  // Status line
            Constraint::Length(3),                                  // Instructions
        ])
        .split(f.area());

    render_title(f, chunks[0]);
    render_groups(f, chunks[1], model);
    render_board(f, chunks[2], model);
    render_message(f, chunks[3], model);
    render_status(f, chunks[4], &model.status);
    render_instructions(f, chunks[5], model.state);
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new("TILE GROUPS")
        .style(HEADER_STYLE)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn group_line(group: &GroupRow, revealed: bool) -> Line<'static> {
    let color = difficulty_color(group.difficulty);
    let label = if revealed {
        format!(" {} (missed) ", group.name)
    } else {
        format!(" {} ", group.name)
    };
    Line::from(vec![
        Span::styled(
            label,
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(group.values.join(", "), Style::default().fg(color)),
    ])
}

fn render_groups(f: &mut Frame, area: Rect, model: &TuiModel) {
    let mut lines: Vec<Line> = model.solved.iter().map(|g| group_line(g, false)).collect();
    lines.extend(model.revealed.iter().map(|g| group_line(g, true)));
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No groups found yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let paragraph =
        Paragraph::new(lines).block(Block::default().title("Groups").borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_board(f: &mut Frame, area: Rect, model: &TuiModel) {
    let title = format!("Tiles ({}/{GROUP_SIZE} selected)", model.grid.selected.len());
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows: Vec<&[String]> = model.grid.tiles.chunks(COLUMNS).collect();
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(TILE_HEIGHT); rows.len()])
        .split(inner);

    for (r, (row, row_area)) in rows.iter().zip(row_areas.iter()).enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, COLUMNS as u32); COLUMNS])
            .split(*row_area);
        for (c, tile) in row.iter().enumerate() {
            let index = r * COLUMNS + c;
            render_tile(f, cells[c], tile, model, index);
        }
    }
}

fn render_tile(f: &mut Frame, area: Rect, tile: &str, model: &TuiModel, index: usize) {
    let style = if model.grid.is_selected(tile) {
        SELECTED_STYLE
    } else {
        TILE_STYLE
    };
    let mut block = Block::default().borders(Borders::ALL);
    if model.state == TuiState::Selecting && index == model.grid.cursor {
        block = block.border_style(CURSOR_BORDER_STYLE);
    }
    let paragraph = Paragraph::new(tile.to_string())
        .style(style)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(paragraph, area);
}

fn render_message(f: &mut Frame, area: Rect, model: &TuiModel) {
    let style = match model.message_kind {
        MessageKind::Info => INFO_STYLE,
        MessageKind::Success => SUCCESS_STYLE,
        MessageKind::Error => ERROR_STYLE,
    };
    let mut lines = Vec::new();
    if !model.message.is_empty() {
        lines.push(Line::from(Span::styled(model.message.as_str(), style)));
    }
    if model.misses_left == Some(1) && model.state == TuiState::Selecting {
        lines.push(Line::from(Span::styled("Last chance!", MESSAGE_STYLE)));
    }
    let paragraph = Paragraph::new(lines)
        .block(Block::default().title("Information").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_status(f: &mut Frame, area: Rect, status: &str) {
    let status_text = if status.is_empty() { "Ready" } else { status };
    let paragraph = Paragraph::new(status_text)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(paragraph, area);
}

fn render_instructions(f: &mut Frame, area: Rect, state: TuiState) {
    let text = match state {
        TuiState::Selecting => {
            "Arrows: Move | SPACE: Select | ENTER: Submit | S: Shuffle | D: Deselect | ESC: Quit"
        }
        TuiState::GameOver => "N: New Game | ESC: Quit",
    };
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

impl GameInterface for TuiInterface {
    fn display_board(&mut self, info: &TurnInfo) {
        self.model.update_board(info);
        self.draw_or_log();
    }

    fn read_action(&mut self) -> Option<UserAction> {
        loop {
            if self.draw().is_err() {
                return Some(UserAction::Exit);
            }
            match self.next_key() {
                Ok(Some(key)) => {
                    if let Some(action) = self.model.handle_key(key) {
                        return Some(action);
                    }
                }
                Ok(None) => {}
                Err(_e) => {
                    debug_log!("read_action() - Input error: {}", _e);
                    return Some(UserAction::Exit);
                }
            }
        }
    }

    fn display_outcome(&mut self, outcome: &Outcome) {
        self.model.apply_outcome(outcome);
        self.draw_or_log();
    }

    fn display_won(&mut self, attempts: usize) {
        self.model.state = TuiState::GameOver;
        self.model.grid.set_tiles(&[]);
        self.model.set_message(
            format!("🎉 You found every group in {attempts} attempts! 🎉"),
            MessageKind::Success,
        );
        self.model.status = "Puzzle complete".to_string();
        self.draw_or_log();
    }

    fn display_out_of_attempts(&mut self, unsolved: &[&Category]) {
        self.model.state = TuiState::GameOver;
        self.model.revealed = unsolved.iter().map(|c| GroupRow::from(*c)).collect();
        self.model.grid.set_tiles(&[]);
        self.model
            .set_message("Out of attempts. Better luck next time!", MessageKind::Error);
        self.model.status = "Game over".to_string();
        self.draw_or_log();
    }

    fn display_game_over_prompt(&mut self) {
        self.model.state = TuiState::GameOver;
        self.draw_or_log();
    }

    fn display_exit_message(&mut self) {
        info_log!("TuiInterface - Exiting");
    }

    fn display_new_game_message(&mut self, tile_count: usize) {
        self.model = TuiModel::new();
        self.model
            .set_message(format!("New game started with {tile_count} tiles."), MessageKind::Info);
    }
}

use std::io;
use std::num::TryFromIntError;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::execute;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use tracing::{debug, info, warn};

use crate::engine::{Board, Visibility};
use crate::error::Result as BoardResult;

/// Terminal columns taken by one cell: the glyph plus a spacer.
const CELL_WIDTH: u16 = 2;

/// Board parameters the TUI needs to start (and restart) a game.
#[derive(Clone, Copy, Debug)]
pub struct GameSettings {
    pub rows: usize,
    pub columns: usize,
    pub mines: usize,
    /// 0 picks a fresh random layout on every new game.
    pub seed: u64,
}

impl GameSettings {
    pub fn new_board(&self) -> BoardResult<Board> {
        if self.seed == 0 {
            Board::new(self.rows, self.columns, self.mines)
        } else {
            Board::with_seed(self.rows, self.columns, self.mines, self.seed)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Reveal,
    ToggleMark,
    Question,
}

pub fn run_tui(settings: GameSettings) -> io::Result<()> {
    let mut board = settings.new_board().map_err(io::Error::other)?;
    let dims = grid_dims(&board)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let _restore = RestoreTerminal;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!(rows = settings.rows, columns = settings.columns, mines = settings.mines, "starting TUI");

    let mut cursor = (0usize, 0usize);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(250);
    let autodemo = std::env::var("MINESWEEPER_TUI_AUTODEMO").ok().is_some();
    let mut demo_step = 0usize;

    let mut last_inner_board = Rect::default();
    let res = loop {
        terminal.draw(|f| { last_inner_board = ui(f, &board, dims, cursor); })?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                        KeyCode::Char('h') | KeyCode::Left => {
                            if cursor.0 > 0 { cursor.0 -= 1; }
                        }
                        KeyCode::Char('l') | KeyCode::Right => {
                            if cursor.0 + 1 < board.columns() { cursor.0 += 1; }
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            if cursor.1 > 0 { cursor.1 -= 1; }
                        }
                        KeyCode::Char('j') | KeyCode::Down => {
                            if cursor.1 + 1 < board.rows() { cursor.1 += 1; }
                        }
                        KeyCode::Char('f') => apply(&mut board, Action::ToggleMark, cursor),
                        KeyCode::Char('?') => apply(&mut board, Action::Question, cursor),
                        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => {
                            apply(&mut board, Action::Reveal, cursor);
                        }
                        KeyCode::Char('n') => restart(&mut board, settings),
                        KeyCode::Char('R') if shift => restart(&mut board, settings),
                        _ => {}
                    }
                }
                Event::Mouse(m) => {
                    if let MouseEventKind::Down(btn) = m.kind {
                        if let Some(cell) = pos_to_cell(m.column, m.row, last_inner_board, dims) {
                            cursor = cell;
                            match btn {
                                MouseButton::Left => apply(&mut board, Action::Reveal, cell),
                                MouseButton::Right => apply(&mut board, Action::ToggleMark, cell),
                                MouseButton::Middle => apply(&mut board, Action::Question, cell),
                            }
                        }
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            if autodemo {
                let centre = (board.columns() / 2, board.rows() / 2);
                let corner = (board.columns() - 1, board.rows() - 1);
                match demo_step {
                    0 => { apply(&mut board, Action::Reveal, (0, 0)); cursor = (1.min(board.columns() - 1), 1.min(board.rows() - 1)); }
                    1 => apply(&mut board, Action::Reveal, cursor),
                    2 => apply(&mut board, Action::ToggleMark, centre),
                    3 => apply(&mut board, Action::Question, corner),
                    4 => { /* pause frame */ }
                    _ => break Ok(()),
                }
                demo_step += 1;
            }
        }
    };

    terminal.show_cursor()?;
    res
}

fn restart(board: &mut Board, settings: GameSettings) {
    match settings.new_board() {
        Ok(b) => { *board = b; info!("new game"); }
        Err(e) => warn!(error = %e, "could not start new game"),
    }
}

/// Board size in terminal units. Fails for boards wider or taller than a terminal can address.
fn grid_dims(board: &Board) -> io::Result<(u16, u16)> {
    let too_big = |_: TryFromIntError| io::Error::other(format!("{}x{} board is too large for the terminal", board.columns(), board.rows()));
    Ok((u16::try_from(board.columns()).map_err(too_big)?, u16::try_from(board.rows()).map_err(too_big)?))
}

// Board input is frozen once the game is decided.
fn apply(board: &mut Board, action: Action, (x, y): (usize, usize)) {
    if board.has_lost() || board.has_won() { return; }
    let res = match action {
        Action::Reveal => board.reveal(x, y).map(|r| { info!(x, y, result = ?r, "reveal"); true }),
        Action::ToggleMark => board.toggle_mark(x, y).map(|o| o.has_update()),
        Action::Question => board.question_mark(x, y).map(|o| o.has_update()),
    }
    .map(|changed| if !changed { debug!(x, y, ?action, "mark ignored on revealed cell") });
    if let Err(e) = res { warn!(error = %e, ?action, "ignored input"); }
}

fn ui(f: &mut ratatui::Frame, board: &Board, dims: (u16, u16), cursor: (usize, usize)) -> Rect {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(f.size());
    let (header_area, board_area, footer_area) = (root[0], root[1], root[2]);

    let status = if board.has_lost() {
        "Boom! You hit a mine. q to quit, n to restart".to_string()
    } else if board.has_won() {
        "You won! q to quit, n to restart".to_string()
    } else {
        format!(
            "Mines left: {}   Mouse: left reveal, right flag, middle ? • Arrows/HJKL move • Enter/Space reveal • f flag • ? mark • n new • q quit",
            board.remaining_mine_count()
        )
    };
    let header = Paragraph::new(status)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Minesweeper"));
    f.render_widget(header, header_area);

    let block = Block::default().borders(Borders::ALL).title("Board");
    let area = centered_grid_area(board_area, dims);
    let inner = block.inner(area);
    f.render_widget(Paragraph::new(board_lines(board, cursor)).block(block), area);

    let footer = Paragraph::new(format!(
        "Size: {}x{}  Mines: {}  Flags: {}",
        board.columns(), board.rows(), board.total_mine_count(), board.flag_count()
    ))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, footer_area);
    inner
}

/// Centres the bordered board inside `parent`, clipped to it.
fn centered_grid_area(parent: Rect, (cols, rows): (u16, u16)) -> Rect {
    let width = cols.saturating_mul(CELL_WIDTH).saturating_add(2).min(parent.width);
    let height = rows.saturating_add(2).min(parent.height);
    Rect {
        x: parent.x + (parent.width - width) / 2,
        y: parent.y + (parent.height - height) / 2,
        width,
        height,
    }
}

fn board_lines(board: &Board, cursor: (usize, usize)) -> Vec<Line<'static>> {
    let game_over = board.has_lost() || board.has_won();
    (0..board.rows())
        .map(|y| {
            let spans: Vec<Span> = (0..board.columns())
                .map(|x| {
                    let (mut ch, mut style) = cell_glyph(board, x, y, game_over).unwrap_or(('?', Style::default()));
                    if cursor == (x, y) {
                        style = style.add_modifier(Modifier::REVERSED);
                        if ch == ' ' { ch = '·'; }
                    }
                    Span::styled(format!("{} ", ch), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn cell_glyph(board: &Board, x: usize, y: usize, show_mines: bool) -> BoardResult<(char, Style)> {
    let state = board.state(x, y)?;
    if board.is_mine(x, y)? && (show_mines || state.is_revealed()) {
        let ch = if board.triggered_mine() == Some((x, y)) { 'X' } else { '*' };
        return Ok((ch, Style::default().fg(Color::Red)));
    }
    Ok(match state {
        Visibility::Hidden => ('·', Style::default().fg(Color::DarkGray)),
        Visibility::Flagged => ('F', Style::default().fg(Color::Yellow)),
        Visibility::Questioned => ('?', Style::default().fg(Color::LightMagenta)),
        Visibility::Revealed => {
            let n = board.adjacent_mine_count(x, y)?;
            let ch = if n == 0 { ' ' } else { char::from_digit(n as u32, 10).unwrap_or('?') };
            (ch, Style::default().fg(count_color(n)))
        }
    })
}

const COUNT_COLORS: [Color; 7] = [Color::Gray, Color::Blue, Color::Green, Color::Red, Color::Magenta, Color::Yellow, Color::Cyan];

fn count_color(n: u8) -> Color {
    COUNT_COLORS.get(n as usize).copied().unwrap_or(Color::White)
}

/// Maps a mouse position to board coordinates; `inner` is the board area inside its border.
fn pos_to_cell(mx: u16, my: u16, inner: Rect, (cols, rows): (u16, u16)) -> Option<(usize, usize)> {
    let cx = mx.checked_sub(inner.x)? / CELL_WIDTH;
    let cy = my.checked_sub(inner.y)?;
    (cx < cols && cy < rows).then_some((cx as usize, cy as usize))
}

struct RestoreTerminal;

impl Drop for RestoreTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_reaches_far_corner() {
        let mut board = Board::with_mines(3, 4, &[(0, 0)]).expect("board");
        let corner = (board.columns() - 1, board.rows() - 1);
        apply(&mut board, Action::Question, corner);
        assert_eq!(board.state(3, 2).unwrap(), Visibility::Questioned);
        apply(&mut board, Action::ToggleMark, corner);
        assert_eq!(board.state(3, 2).unwrap(), Visibility::Hidden);
    }

    #[test]
    fn apply_is_frozen_after_loss() {
        let mut board = Board::with_mines(3, 3, &[(0, 0)]).expect("board");
        apply(&mut board, Action::Reveal, (0, 0));
        assert!(board.has_lost());
        apply(&mut board, Action::Reveal, (2, 2));
        apply(&mut board, Action::ToggleMark, (1, 1));
        assert_eq!(board.state(2, 2).unwrap(), Visibility::Hidden);
        assert_eq!(board.state(1, 1).unwrap(), Visibility::Hidden);
    }

    #[test]
    fn apply_ignores_out_of_bounds() {
        let mut board = Board::with_mines(2, 2, &[(0, 0)]).expect("board");
        apply(&mut board, Action::Reveal, (5, 5));
        assert_eq!(board.hidden_safe_cell_count(), 3);
    }

    #[test]
    fn wide_board_fits_parent() {
        let parent = Rect { x: 0, y: 0, width: 80, height: 24 };
        let area = centered_grid_area(parent, (40000, 1));
        assert_eq!(area.width, 80);
        assert_eq!(area.height, 3);
        let area = centered_grid_area(parent, (u16::MAX, u16::MAX));
        assert_eq!(area, parent);
    }

    #[test]
    fn small_board_is_centred() {
        let parent = Rect { x: 0, y: 3, width: 80, height: 24 };
        let area = centered_grid_area(parent, (9, 9));
        assert_eq!(area, Rect { x: 30, y: 9, width: 20, height: 11 });
    }

    #[test]
    fn oversized_board_is_rejected() {
        let board = Board::with_mines(1, 70_000, &[]).expect("board");
        assert!(grid_dims(&board).is_err());
        let board = Board::with_mines(16, 30, &[]).expect("board");
        assert_eq!(grid_dims(&board).unwrap(), (30, 16));
    }

    #[test]
    fn mouse_maps_to_cells() {
        let inner = Rect { x: 10, y: 5, width: 18, height: 9 };
        assert_eq!(pos_to_cell(10, 5, inner, (9, 9)), Some((0, 0)));
        assert_eq!(pos_to_cell(13, 7, inner, (9, 9)), Some((1, 2)));
        assert_eq!(pos_to_cell(9, 5, inner, (9, 9)), None);
        assert_eq!(pos_to_cell(28, 5, inner, (9, 9)), None);
        assert_eq!(pos_to_cell(10, 14, inner, (9, 9)), None);
    }
}

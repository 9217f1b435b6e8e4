use std::fmt::{self, Write as _};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::{BoardError, Result};

/// Mine count used when the caller doesn't pick one.
pub const DEFAULT_MINE_COUNT: usize = 25;

/// Player-visible state of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Hidden,
    Revealed,
    Flagged,
    Questioned,
}

impl Visibility {
    pub fn is_revealed(self) -> bool { matches!(self, Visibility::Revealed) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealResult {
    NoOp,
    RevealedSafe { cells: usize },
    HitMine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub fn has_update(self) -> bool { matches!(self, MarkOutcome::Changed) }
}

#[derive(Clone, Debug, Default)]
struct Cell {
    has_mine: bool,
    visibility: Visibility,
}

/// A single game's grid, its mine layout and the counters that decide the outcome.
///
/// Coordinates are `(x, y)` with `x` in `0..columns` and `y` in `0..rows`.
#[derive(Clone, Debug)]
pub struct Board {
    rows: usize,
    columns: usize,
    mines: usize,
    cells: Vec<Cell>,
    hidden_safe: usize,
    flags: usize,
    triggered: Option<(usize, usize)>,
}

impl Board {
    /// Builds a board and scatters `mines` mines using the thread-local RNG.
    pub fn new(rows: usize, columns: usize, mines: usize) -> Result<Self> {
        Self::with_rng(rows, columns, mines, &mut rand::rng())
    }

    pub fn with_default_mines(rows: usize, columns: usize) -> Result<Self> {
        Self::new(rows, columns, DEFAULT_MINE_COUNT)
    }

    /// Same layout for the same seed, useful for replays and tests.
    pub fn with_seed(rows: usize, columns: usize, mines: usize, seed: u64) -> Result<Self> {
        Self::with_rng(rows, columns, mines, &mut StdRng::seed_from_u64(seed))
    }

    /// Places mines by rejection sampling: draw a coordinate, redraw while it already holds a mine.
    ///
    /// Fails before sampling when `mines >= rows * columns`, otherwise the loop could never finish.
    pub fn with_rng<R: Rng>(rows: usize, columns: usize, mines: usize, rng: &mut R) -> Result<Self> {
        let mut board = Self::empty(rows, columns)?;
        board.check_mine_count(mines)?;

        let mut placed = 0;
        while placed < mines {
            let x = rng.random_range(0..columns);
            let y = rng.random_range(0..rows);
            let i = idx(columns, x, y);
            if board.cells[i].has_mine { continue; }
            board.cells[i].has_mine = true;
            placed += 1;
        }
        board.set_mine_total(mines);
        debug!(rows, columns, mines, "placed mines");
        Ok(board)
    }

    /// Builds a board with mines at exactly the given coordinates. Duplicates count once.
    pub fn with_mines(rows: usize, columns: usize, mines: &[(usize, usize)]) -> Result<Self> {
        let mut board = Self::empty(rows, columns)?;
        let mut placed = 0;
        for &(x, y) in mines {
            let i = board.index(x, y)?;
            if !board.cells[i].has_mine {
                board.cells[i].has_mine = true;
                placed += 1;
            }
        }
        board.check_mine_count(placed)?;
        board.set_mine_total(placed);
        debug!(rows, columns, mines = placed, "loaded fixed mine layout");
        Ok(board)
    }

    fn empty(rows: usize, columns: usize) -> Result<Self> {
        if rows == 0 || columns == 0 { return Err(BoardError::InvalidDimensions { rows, columns }); }
        let total = rows.checked_mul(columns).ok_or(BoardError::InvalidDimensions { rows, columns })?;
        Ok(Self {
            rows,
            columns,
            mines: 0,
            cells: vec![Cell::default(); total],
            hidden_safe: total,
            flags: 0,
            triggered: None,
        })
    }

    fn check_mine_count(&self, mines: usize) -> Result<()> {
        let cells = self.cells.len();
        if mines >= cells { return Err(BoardError::TooManyMines { mines, cells }); }
        Ok(())
    }

    fn set_mine_total(&mut self, mines: usize) {
        self.mines = mines;
        self.hidden_safe = self.cells.len() - mines;
    }

    /// Left-click action.
    ///
    /// A mine is revealed on its own and marks the game lost. A safe cell is revealed and, if it
    /// has no adjacent mines, the reveal spreads over its neighbours until it reaches numbered
    /// cells. Flagged or questioned safe cells caught in the spread are revealed as well.
    pub fn reveal(&mut self, x: usize, y: usize) -> Result<RevealResult> {
        let i = self.index(x, y)?;
        if self.cells[i].visibility.is_revealed() { return Ok(RevealResult::NoOp); }

        if self.cells[i].has_mine {
            self.uncover(i);
            if self.triggered.is_none() { self.triggered = Some((x, y)); }
            info!(x, y, "mine triggered");
            return Ok(RevealResult::HitMine);
        }

        let cells = self.flood_reveal(x, y);
        debug!(x, y, cells, hidden_safe = self.hidden_safe, "revealed");
        if self.has_won() { info!("all safe cells revealed"); }
        Ok(RevealResult::RevealedSafe { cells })
    }

    // Explicit stack instead of recursion; the revealed check keeps each cell to one visit.
    fn flood_reveal(&mut self, x: usize, y: usize) -> usize {
        let mut revealed = 0;
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            let i = idx(self.columns, cx, cy);
            if self.cells[i].visibility.is_revealed() || self.cells[i].has_mine { continue; }
            self.uncover(i);
            self.hidden_safe -= 1;
            revealed += 1;
            if self.count_adjacent(cx, cy) == 0 {
                for (nx, ny) in neighbors(self.columns, self.rows, cx, cy) {
                    let ni = idx(self.columns, nx, ny);
                    if !self.cells[ni].visibility.is_revealed() && !self.cells[ni].has_mine {
                        stack.push((nx, ny));
                    }
                }
            }
        }
        revealed
    }

    fn uncover(&mut self, i: usize) {
        if self.cells[i].visibility == Visibility::Flagged { self.flags -= 1; }
        self.cells[i].visibility = Visibility::Revealed;
    }

    /// Right-click action: `Flagged -> Hidden`, `Hidden -> Flagged`, `Questioned -> Hidden`.
    ///
    /// There is no arc into `Questioned` here; use [`Board::question_mark`] for that.
    /// Revealed cells are left alone and report [`MarkOutcome::NoChange`].
    pub fn toggle_mark(&mut self, x: usize, y: usize) -> Result<MarkOutcome> {
        let i = self.index(x, y)?;
        let next = match self.cells[i].visibility {
            Visibility::Revealed => return Ok(MarkOutcome::NoChange),
            Visibility::Flagged => Visibility::Hidden,
            Visibility::Hidden => Visibility::Flagged,
            Visibility::Questioned => Visibility::Hidden,
        };
        self.set_mark(i, next);
        Ok(MarkOutcome::Changed)
    }

    /// Puts a question mark on an unrevealed cell, or clears an existing one.
    pub fn question_mark(&mut self, x: usize, y: usize) -> Result<MarkOutcome> {
        let i = self.index(x, y)?;
        let next = match self.cells[i].visibility {
            Visibility::Revealed => return Ok(MarkOutcome::NoChange),
            Visibility::Questioned => Visibility::Hidden,
            Visibility::Hidden | Visibility::Flagged => Visibility::Questioned,
        };
        self.set_mark(i, next);
        Ok(MarkOutcome::Changed)
    }

    fn set_mark(&mut self, i: usize, next: Visibility) {
        let was_flag = self.cells[i].visibility == Visibility::Flagged;
        let is_flag = next == Visibility::Flagged;
        if is_flag && !was_flag { self.flags += 1; }
        if was_flag && !is_flag { self.flags -= 1; }
        self.cells[i].visibility = next;
    }

    pub fn state(&self, x: usize, y: usize) -> Result<Visibility> {
        Ok(self.cells[self.index(x, y)?].visibility)
    }

    /// Meant for the end-of-game display; calling it mid-game leaks the layout.
    pub fn is_mine(&self, x: usize, y: usize) -> Result<bool> {
        Ok(self.cells[self.index(x, y)?].has_mine)
    }

    /// Mines among the up to eight in-bounds neighbours. Valid for any cell, revealed or not.
    pub fn adjacent_mine_count(&self, x: usize, y: usize) -> Result<u8> {
        self.index(x, y)?;
        Ok(self.count_adjacent(x, y))
    }

    fn count_adjacent(&self, x: usize, y: usize) -> u8 {
        neighbors(self.columns, self.rows, x, y)
            .filter(|&(nx, ny)| self.cells[idx(self.columns, nx, ny)].has_mine)
            .count() as u8
    }

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.columns || y >= self.rows {
            return Err(BoardError::OutOfBounds { x, y, columns: self.columns, rows: self.rows });
        }
        Ok(idx(self.columns, x, y))
    }

    pub fn render(&self, show_mines: bool, one_based: bool) -> String {
        let mut s = String::new();
        // Column header
        s.push_str("    ");
        for x in 0..self.columns {
            let label = if one_based { x + 1 } else { x };
            let _ = write!(s, "{:>2} ", label);
        }
        s.push('\n');
        s.push_str("   ");
        s.push_str(&"-".repeat(self.columns * 3 + 1));
        s.push('\n');

        for y in 0..self.rows {
            let row_label = if one_based { y + 1 } else { y };
            let _ = write!(s, "{:>2} | ", row_label);
            for x in 0..self.columns {
                let c = &self.cells[idx(self.columns, x, y)];
                let ch = if c.has_mine && (show_mines || c.visibility.is_revealed()) {
                    if self.triggered == Some((x, y)) { 'X' } else { '*' }
                } else {
                    match c.visibility {
                        Visibility::Hidden => '.',
                        Visibility::Flagged => 'F',
                        Visibility::Questioned => '?',
                        Visibility::Revealed => match self.count_adjacent(x, y) {
                            0 => ' ',
                            n => char::from_digit(n as u32, 10).unwrap_or('?'),
                        },
                    }
                };
                let _ = write!(s, "{}  ", ch);
            }
            s.push('\n');
        }
        s
    }
}

fn idx(columns: usize, x: usize, y: usize) -> usize { y * columns + x }

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0), (1, 0),
    (-1, 1), (0, 1), (1, 1),
];

fn neighbors(columns: usize, rows: usize, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < columns && ny < rows).then_some((nx, ny))
    })
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false, true))
    }
}

// Read-only queries
impl Board {
    pub fn rows(&self) -> usize { self.rows }
    pub fn columns(&self) -> usize { self.columns }
    pub fn total_mine_count(&self) -> usize { self.mines }
    pub fn flag_count(&self) -> usize { self.flags }
    pub fn hidden_safe_cell_count(&self) -> usize { self.hidden_safe }
    /// Mines minus placed flags; negative when the player over-flags.
    pub fn remaining_mine_count(&self) -> isize { self.mines as isize - self.flags as isize }
    pub fn has_won(&self) -> bool { self.hidden_safe == 0 }
    pub fn has_lost(&self) -> bool { self.triggered.is_some() }
    /// First mine the player revealed, if any.
    pub fn triggered_mine(&self) -> Option<(usize, usize)> { self.triggered }
}

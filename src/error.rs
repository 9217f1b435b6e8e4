use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board dimensions must be positive, got {rows} rows x {columns} columns")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("Mines must be less than cells ({mines} mines for {cells} cells)")]
    TooManyMines { mines: usize, cells: usize },
    #[error("Coordinates ({x}, {y}) outside {columns}x{rows} board")]
    OutOfBounds { x: usize, y: usize, columns: usize, rows: usize },
}

pub type Result<T> = std::result::Result<T, BoardError>;

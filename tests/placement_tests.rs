use minefield::{Board, BoardError, DEFAULT_MINE_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn count_mines(b: &Board) -> usize {
    let mut n = 0;
    for y in 0..b.rows() {
        for x in 0..b.columns() {
            if b.is_mine(x, y).unwrap() { n += 1; }
        }
    }
    n
}

#[test]
fn fresh_board_has_exact_mine_count() {
    for seed in 1..20u64 {
        let b = Board::with_seed(9, 9, 10, seed).expect("board");
        assert_eq!(count_mines(&b), 10);
        assert_eq!(b.total_mine_count(), 10);
        assert_eq!(b.hidden_safe_cell_count(), 71);
        assert_eq!(b.remaining_mine_count(), 10);
        assert!(!b.has_won());
        assert!(!b.has_lost());
        assert_eq!(b.triggered_mine(), None);
    }
}

#[test]
fn dense_board_still_terminates() {
    let b = Board::with_seed(4, 4, 15, 3).expect("board");
    assert_eq!(count_mines(&b), 15);
    assert_eq!(b.hidden_safe_cell_count(), 1);
}

#[test]
fn thread_rng_board() {
    let b = Board::new(16, 30, 99).expect("board");
    assert_eq!(count_mines(&b), 99);
    let b = Board::with_default_mines(16, 16).expect("board");
    assert_eq!(count_mines(&b), DEFAULT_MINE_COUNT);
}

#[test]
fn same_seed_same_layout() {
    let a = Board::with_seed(10, 12, 30, 42).expect("board");
    let b = Board::with_rng(10, 12, 30, &mut StdRng::seed_from_u64(42)).expect("board");
    for y in 0..10 {
        for x in 0..12 {
            assert_eq!(a.is_mine(x, y).unwrap(), b.is_mine(x, y).unwrap());
        }
    }
}

#[test]
fn rectangular_axes() {
    let b = Board::with_seed(4, 7, 5, 11).expect("board");
    assert_eq!(b.rows(), 4);
    assert_eq!(b.columns(), 7);
    assert!(b.is_mine(6, 3).is_ok());
    assert_eq!(b.is_mine(3, 6), Err(BoardError::OutOfBounds { x: 3, y: 6, columns: 7, rows: 4 }));
}

#[test]
fn rejects_bad_configuration() {
    assert_eq!(Board::new(0, 5, 1).unwrap_err(), BoardError::InvalidDimensions { rows: 0, columns: 5 });
    assert_eq!(Board::new(5, 0, 1).unwrap_err(), BoardError::InvalidDimensions { rows: 5, columns: 0 });
    assert_eq!(Board::new(3, 3, 9).unwrap_err(), BoardError::TooManyMines { mines: 9, cells: 9 });
    assert_eq!(Board::new(3, 3, 50).unwrap_err(), BoardError::TooManyMines { mines: 50, cells: 9 });
    // the default mine count needs more than 25 cells
    assert!(Board::with_default_mines(5, 5).is_err());
}

#[test]
fn fixed_layout() {
    let b = Board::with_mines(3, 3, &[(1, 1), (1, 1), (0, 2)]).expect("board");
    assert_eq!(b.total_mine_count(), 2);
    assert_eq!(b.hidden_safe_cell_count(), 7);
    assert!(b.is_mine(1, 1).unwrap());
    assert!(b.is_mine(0, 2).unwrap());
    assert!(!b.is_mine(2, 0).unwrap());

    let full = [(0, 0), (1, 0), (0, 1), (1, 1)];
    assert_eq!(Board::with_mines(2, 2, &full).unwrap_err(), BoardError::TooManyMines { mines: 4, cells: 4 });
    assert_eq!(
        Board::with_mines(2, 2, &[(2, 0)]).unwrap_err(),
        BoardError::OutOfBounds { x: 2, y: 0, columns: 2, rows: 2 }
    );
}

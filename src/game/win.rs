//! Win detection for the 3×3 board.

use super::{Board, Symbol};

/// Every row, column and diagonal, as board indices in row-major order.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the symbol occupying any complete line, or `None`.
///
/// A full board without a complete line is a tie and also yields `None`.
#[must_use]
pub fn evaluate(board: &Board) -> Option<Symbol> {
    LINES.iter().find_map(|&[a, b, c]| match (board[a], board[b], board[c]) {
        (Some(first), Some(second), Some(third)) if first == second && second == third => {
            Some(first)
        }
        _ => None,
    })
}

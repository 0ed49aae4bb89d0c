//! Fading tic-tac-toe rules.
//!
//! The board is a plain 3×3 grid, but each symbol may only keep
//! [`MAX_LIVE_MARKS`] marks on it at once: placing a fourth mark evicts that
//! player's oldest surviving mark.

pub mod state;
pub mod win;

pub use state::{Game, GamePhase, MoveApplied, MoveRecord, MoveRejection};
pub use win::evaluate;

use serde::{Deserialize, Serialize};

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// Maximum number of marks a single symbol may have on the board.
pub const MAX_LIVE_MARKS: usize = 3;

/// Board cells in row-major order; `None` is an empty cell.
pub type Board = [Option<Symbol>; BOARD_CELLS];

/// Mark placed by an active player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// First seat, moves first.
    X,
    /// Second seat.
    O,
}

impl Symbol {
    /// Returns the other symbol.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    /// Symbol assigned to a seat in the active-player list.
    ///
    /// Seat 0 plays `X`, seat 1 plays `O`; any other seat has no symbol.
    #[must_use]
    pub const fn for_seat(seat: usize) -> Option<Self> {
        match seat {
            0 => Some(Self::X),
            1 => Some(Self::O),
            _ => None,
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::X => "X",
            Self::O => "O",
        })
    }
}

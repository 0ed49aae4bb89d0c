//! Per-lobby game state machine.
//!
//! ```text
//! NotStarted --start--> InProgress --winning move--> Won
//!      ^                                              |
//!      +------------------- rematch ------------------+
//! ```
//!
//! `NotStarted` is represented by the owning lobby having no [`Game`]; the
//! other two phases are distinguished by whether [`Game::winner`] is set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::win::evaluate;
use super::{Board, Symbol, BOARD_CELLS, MAX_LIVE_MARKS};

/// One entry of the move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player: Symbol,
    pub index: usize,
}

/// Lifecycle phase of a lobby's game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "winner")]
pub enum GamePhase {
    NotStarted,
    InProgress,
    Won(Symbol),
}

/// Why a move was not applied. The game is left untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejection {
    #[error("cell index {index} is outside the board")]
    OutOfRange { index: usize },
    #[error("cell {index} is already occupied")]
    CellOccupied { index: usize },
    #[error("game is already won by {winner}")]
    GameOver { winner: Symbol },
    #[error("it is {expected}'s turn, not {actual}'s")]
    NotYourTurn { expected: Symbol, actual: Symbol },
}

/// Effects of a successfully applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveApplied {
    /// Cell cleared by the sliding window, if the mover exceeded the limit.
    pub evicted: Option<usize>,
    /// Winner after the move.
    pub winner: Option<Symbol>,
}

/// Board, turn and history for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    board: Board,
    current_player: Symbol,
    winner: Option<Symbol>,
    move_history: Vec<MoveRecord>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Empty board with `X` to move.
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: [None; BOARD_CELLS],
            current_player: Symbol::X,
            winner: None,
            move_history: Vec::with_capacity(MAX_LIVE_MARKS * 2 + 1),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Symbol {
        self.current_player
    }

    pub fn winner(&self) -> Option<Symbol> {
        self.winner
    }

    /// Live moves, oldest first.
    pub fn move_history(&self) -> &[MoveRecord] {
        &self.move_history
    }

    pub fn phase(&self) -> GamePhase {
        match self.winner {
            Some(symbol) => GamePhase::Won(symbol),
            None => GamePhase::InProgress,
        }
    }

    /// Number of live moves recorded for `symbol`.
    pub fn live_marks(&self, symbol: Symbol) -> usize {
        self.move_history
            .iter()
            .filter(|record| record.player == symbol)
            .count()
    }

    /// Apply a move for `symbol` at `index`.
    ///
    /// Checks, in order: index on the board, cell empty, no winner yet, and
    /// that it is `symbol`'s turn. On success the mark is placed, the mover's
    /// oldest mark is evicted if they now exceed [`MAX_LIVE_MARKS`], the winner
    /// is recomputed on the post-eviction board and the turn passes to the
    /// opponent, even when the move won the game.
    pub fn apply_move(
        &mut self,
        symbol: Symbol,
        index: usize,
    ) -> Result<MoveApplied, MoveRejection> {
        let Some(cell) = self.board.get(index) else {
            return Err(MoveRejection::OutOfRange { index });
        };
        if cell.is_some() {
            return Err(MoveRejection::CellOccupied { index });
        }
        if let Some(winner) = self.winner {
            return Err(MoveRejection::GameOver { winner });
        }
        if symbol != self.current_player {
            return Err(MoveRejection::NotYourTurn {
                expected: self.current_player,
                actual: symbol,
            });
        }

        self.board[index] = Some(symbol);
        self.move_history.push(MoveRecord {
            player: symbol,
            index,
        });

        let evicted = self.evict_oldest_if_over_limit(symbol);

        self.winner = evaluate(&self.board);
        self.current_player = self.current_player.opponent();

        Ok(MoveApplied {
            evicted,
            winner: self.winner,
        })
    }

    fn evict_oldest_if_over_limit(&mut self, symbol: Symbol) -> Option<usize> {
        if self.live_marks(symbol) <= MAX_LIVE_MARKS {
            return None;
        }
        let position = self
            .move_history
            .iter()
            .position(|record| record.player == symbol)?;
        let oldest = self.move_history.remove(position);
        self.board[oldest.index] = None;
        Some(oldest.index)
    }
}

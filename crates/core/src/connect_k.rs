use crate::error::{GameError, Result};
use crate::lines::WinLines;
use crate::state::{ActionMask, Cell, GameState, Player};
use crate::{check_distribution, check_symmetry, GameRules};

/// Connect Four generalised to a rows x cols board with k in a row to win.
///
/// Actions are columns; a token drops to the lowest empty cell.
#[derive(Debug, Clone)]
pub struct ConnectK {
    rows: usize,
    cols: usize,
    lines: WinLines,
}

impl ConnectK {
    /// Requires `1 <= rows, cols` and `1 <= k <= min(rows, cols)`
    pub fn new(rows: usize, cols: usize, k: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidParameters(format!(
                "board must be non-empty, got {rows}x{cols}"
            )));
        }
        if k == 0 || k > rows.min(cols) {
            return Err(GameError::InvalidParameters(format!(
                "k = {k} must be in 1..={}",
                rows.min(cols)
            )));
        }
        Ok(Self {
            rows,
            cols,
            lines: WinLines::new(rows, cols, k),
        })
    }

    /// Classic Connect Four: 6 rows, 7 columns, four in a row
    pub fn connect_four() -> Self {
        Self {
            rows: 6,
            cols: 7,
            lines: WinLines::new(6, 7, 4),
        }
    }

    /// Row a token dropped in `col` would land on, if the column has room
    fn landing_row(&self, board: &[Cell], col: usize) -> Option<usize> {
        (0..self.rows)
            .rev()
            .find(|&row| board[row * self.cols + col].is_none())
    }
}

impl Default for ConnectK {
    fn default() -> Self {
        Self::connect_four()
    }
}

impl GameRules for ConnectK {
    fn board_shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn action_size(&self) -> usize {
        self.cols
    }

    fn start_state(&self) -> GameState {
        GameState::from_parts(vec![None; self.rows * self.cols], Player::Zero, None)
    }

    fn next_state(&self, state: &GameState, action: usize) -> Result<GameState> {
        if self.is_terminal(state) {
            return Err(GameError::TerminalState);
        }
        if action >= self.cols {
            return Err(GameError::ActionOutOfRange {
                action,
                size: self.cols,
            });
        }
        let row = self
            .landing_row(state.board(), action)
            .ok_or(GameError::IllegalAction { action })?;

        let mover = state.player();
        let cell = row * self.cols + action;
        let mut board = state.board().to_vec();
        board[cell] = Some(mover);

        let winner = self
            .lines
            .completes_through(&board, cell, mover)
            .then_some(mover);

        Ok(GameState::from_parts(board, mover.other(), winner))
    }

    fn action_mask(&self, state: &GameState) -> Result<ActionMask> {
        if self.is_terminal(state) {
            return Err(GameError::TerminalState);
        }
        // The top row decides whether a column still has room
        let bits = state.board()[..self.cols]
            .iter()
            .map(Option::is_none)
            .collect();
        Ok(ActionMask::new(bits))
    }

    fn symmetry_count(&self) -> usize {
        // Identity and horizontal flip
        2
    }

    fn transform_state(&self, state: &GameState, symmetry: usize) -> Result<GameState> {
        check_symmetry(symmetry, 2)?;
        if symmetry == 0 {
            return Ok(state.clone());
        }
        let board = state
            .board()
            .chunks(self.cols)
            .flat_map(|row| row.iter().rev().copied())
            .collect();
        Ok(GameState::from_parts(board, state.player(), state.winner()))
    }

    fn transform_distribution(&self, distribution: &[f32], symmetry: usize) -> Result<Vec<f32>> {
        check_symmetry(symmetry, 2)?;
        check_distribution(distribution, self.cols)?;
        let mut out = distribution.to_vec();
        if symmetry == 1 {
            out.reverse();
        }
        Ok(out)
    }

    fn inverse_symmetry(&self, symmetry: usize) -> Result<usize> {
        check_symmetry(symmetry, 2)?;
        Ok(symmetry)
    }
}

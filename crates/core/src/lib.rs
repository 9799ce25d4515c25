//! Rules for two-player, zero-sum, perfect-information grid games.
//!
//! Every game implements [`GameRules`], a stateless transition function over
//! immutable [`GameState`] values. Rules objects are `Send + Sync` and can be
//! shared by any number of concurrent searches without locking.

mod connect_k;
mod error;
mod lines;
mod pentago;
mod state;

pub use connect_k::ConnectK;
pub use error::{GameError, Result};
pub use lines::WinLines;
pub use pentago::Pentago;
pub use state::{ActionMask, Cell, GameState, Player};

/// Number of planes produced by [`GameRules::encode`]
pub const ENCODED_PLANES: usize = 3;

/// Stateless rules of a specific game
pub trait GameRules: Send + Sync {
    /// Board dimensions as (rows, cols)
    fn board_shape(&self) -> (usize, usize);

    /// Size of the action space
    fn action_size(&self) -> usize;

    /// Initial position: empty board, player zero to move
    fn start_state(&self) -> GameState;

    /// Apply `action` to a non-terminal `state`.
    ///
    /// Fails with [`GameError::TerminalState`] or [`GameError::IllegalAction`]
    /// when the precondition does not hold.
    fn next_state(&self, state: &GameState, action: usize) -> Result<GameState>;

    /// Actions playable in a non-terminal `state`
    fn action_mask(&self, state: &GameState) -> Result<ActionMask>;

    /// Number of board symmetries, including the identity at index 0
    fn symmetry_count(&self) -> usize;

    /// Image of `state` under a single symmetry
    fn transform_state(&self, state: &GameState, symmetry: usize) -> Result<GameState>;

    /// Image of an action distribution under a single symmetry
    fn transform_distribution(&self, distribution: &[f32], symmetry: usize) -> Result<Vec<f32>>;

    /// Symmetry that undoes `symmetry`
    fn inverse_symmetry(&self, symmetry: usize) -> Result<usize>;

    /// True if the game is decided or no empty cell remains
    fn is_terminal(&self, state: &GameState) -> bool {
        state.winner().is_some() || state.is_full()
    }

    /// Rewards for (player zero, player one); always zero-sum
    fn rewards(&self, state: &GameState) -> [f32; 2] {
        match state.winner() {
            None => [0.0, 0.0],
            Some(Player::Zero) => [1.0, -1.0],
            Some(Player::One) => [-1.0, 1.0],
        }
    }

    fn apply_symmetries(&self, state: &GameState, symmetries: &[usize]) -> Result<Vec<GameState>> {
        symmetries
            .iter()
            .map(|&sym| self.transform_state(state, sym))
            .collect()
    }

    fn apply_symmetries_to_distribution(
        &self,
        distribution: &[f32],
        symmetries: &[usize],
    ) -> Result<Vec<Vec<f32>>> {
        symmetries
            .iter()
            .map(|&sym| self.transform_distribution(distribution, sym))
            .collect()
    }

    /// All symmetry indices, identity first
    fn all_symmetries(&self) -> Vec<usize> {
        (0..self.symmetry_count()).collect()
    }

    /// Text rendering for diagnostics
    fn display(&self, state: &GameState) -> String {
        let (rows, cols) = self.board_shape();
        let mut out = String::with_capacity(rows * (2 * cols + 1));
        for row in 0..rows {
            for col in 0..cols {
                out.push(match state.board()[row * cols + col] {
                    None => '.',
                    Some(Player::Zero) => 'O',
                    Some(Player::One) => 'X',
                });
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }

    /// Network input planes, flattened as `[ENCODED_PLANES, rows, cols]`:
    /// stones of the player to move, opponent stones, and a colour plane set
    /// to 1.0 when player zero is to move.
    fn encode(&self, state: &GameState) -> Vec<f32> {
        let (rows, cols) = self.board_shape();
        let area = rows * cols;
        let mut planes = vec![0.0f32; ENCODED_PLANES * area];
        let mover = state.player();

        for (idx, cell) in state.board().iter().enumerate() {
            match cell {
                Some(p) if *p == mover => planes[idx] = 1.0,
                Some(_) => planes[area + idx] = 1.0,
                None => {}
            }
        }
        if mover == Player::Zero {
            planes[2 * area..].fill(1.0);
        }
        planes
    }
}

pub(crate) fn check_symmetry(index: usize, count: usize) -> Result<()> {
    if index < count {
        Ok(())
    } else {
        Err(GameError::InvalidSymmetry { index, count })
    }
}

pub(crate) fn check_distribution(distribution: &[f32], expected: usize) -> Result<()> {
    if distribution.len() == expected {
        Ok(())
    } else {
        Err(GameError::DistributionLength {
            expected,
            actual: distribution.len(),
        })
    }
}

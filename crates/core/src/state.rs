use serde::{Deserialize, Serialize};

/// One of the two players. Player zero always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Zero,
    One,
}

impl Player {
    /// The opponent of this player
    pub fn other(self) -> Player {
        match self {
            Player::Zero => Player::One,
            Player::One => Player::Zero,
        }
    }

    /// Index into per-player arrays (0 or 1)
    pub fn index(self) -> usize {
        match self {
            Player::Zero => 0,
            Player::One => 1,
        }
    }
}

/// Content of a single board cell: `None` when empty
pub type Cell = Option<Player>;

/// Immutable snapshot of a game position.
///
/// Only [`crate::GameRules`] implementations create states, through
/// `start_state` and `next_state`. There are no mutating accessors, so a
/// state can be shared freely between threads and search trees.
///
/// ```compile_fail
/// use gridzero_core::{GameState, Player};
///
/// let state = GameState::from_parts(vec![None; 4], Player::One, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameState {
    board: Vec<Cell>,
    player: Player,
    winner: Option<Player>,
}

impl GameState {
    /// Assemble a state from its parts. Used by game implementations.
    pub(crate) fn from_parts(board: Vec<Cell>, player: Player, winner: Option<Player>) -> Self {
        Self {
            board,
            player,
            winner,
        }
    }

    /// Cells in row-major order
    pub fn board(&self) -> &[Cell] {
        &self.board
    }

    /// Player to move
    pub fn player(&self) -> Player {
        self.player
    }

    /// Winner, if the game has been decided
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// True when no cell is empty
    pub fn is_full(&self) -> bool {
        self.board.iter().all(Option::is_some)
    }
}

/// Set of actions currently playable, indexed over the full action space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMask {
    bits: Vec<bool>,
}

impl ActionMask {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// A mask of the given size with no legal actions
    pub fn empty(size: usize) -> Self {
        Self {
            bits: vec![false; size],
        }
    }

    pub fn set(&mut self, action: usize) {
        self.bits[action] = true;
    }

    pub fn is_legal(&self, action: usize) -> bool {
        self.bits.get(action).copied().unwrap_or(false)
    }

    /// Size of the action space
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of legal actions
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Legal action indices in ascending order
    pub fn iter_legal(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &legal)| legal)
            .map(|(a, _)| a)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

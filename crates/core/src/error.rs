use thiserror::Error;

/// Precondition violations raised by game rules.
///
/// These indicate a caller bug: the current search or game is aborted and
/// nothing retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Action {action} is not legal in this position")]
    IllegalAction { action: usize },

    #[error("Action {action} is outside the action space of size {size}")]
    ActionOutOfRange { action: usize, size: usize },

    #[error("Position is terminal")]
    TerminalState,

    #[error("Invalid symmetry index {index} (game has {count})")]
    InvalidSymmetry { index: usize, count: usize },

    #[error("Distribution has length {actual}, expected {expected}")]
    DistributionLength { expected: usize, actual: usize },

    #[error("Invalid game parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, GameError>;

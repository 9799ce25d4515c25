use thiserror::Error;

use crate::tree::NodeId;

#[derive(Error, Debug)]
pub enum MctsError {
    #[error("Game rules error: {0}")]
    Game(#[from] gridzero_core::GameError),

    #[error("Terminal position cannot be searched or expanded")]
    TerminalPosition,

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Invalid node ID: {0}")]
    InvalidNodeId(NodeId),

    #[error("Node {0} is already expanded")]
    AlreadyExpanded(NodeId),

    #[error("Root node not initialized")]
    RootNotInitialized,

    #[error("Leaf evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Dirichlet sampling error: {0}")]
    DirichletError(String),
}

pub type Result<T> = std::result::Result<T, MctsError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Game rules error: {0}")]
    Game(#[from] gridzero_core::GameError),

    #[error("Model error: {0}")]
    Model(#[from] gridzero_nn::NnError),

    #[error("Self-play failed: {0}")]
    SelfPlay(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Coordinator hung up before task {task_id} delivered iteration {iteration}")]
    Disconnected { task_id: usize, iteration: u32 },
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

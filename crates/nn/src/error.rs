use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NnError {
    #[error("Model file not found after {waited:?}: {path}")]
    ModelTimeout { path: PathBuf, waited: Duration },

    #[error("TorchScript models need the `torch` feature: {0}")]
    TorchUnavailable(PathBuf),

    #[cfg(feature = "torch")]
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    #[error("Unexpected model output: {0}")]
    BadOutput(String),
}

pub type Result<T> = std::result::Result<T, NnError>;

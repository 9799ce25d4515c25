//! Trained-model handles and leaf evaluation backed by them.
//!
//! Without the `torch` feature only the uniform sentinel can be evaluated.

mod error;
mod handle;
#[cfg(feature = "torch")]
mod torch;

pub use error::{NnError, Result};
pub use handle::{load_evaluator, model_path, wait_for_model, ModelHandle};
#[cfg(feature = "torch")]
pub use torch::{NnModel, TorchEvaluator};

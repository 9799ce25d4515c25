use std::path::Path;

use gridzero_core::{GameRules, ENCODED_PLANES};
use gridzero_selfplay::storage::artifact_file;
use gridzero_selfplay::{Artifact, TrainingExample};
use ndarray::{Array, Array1};
use ndarray_npy::write_npy;

use crate::error::{CoordinatorError, Result};

/// Write a training set for the external trainer.
///
/// Same layout as a worker artifact plus `{prefix}_recency.npy` holding the
/// per-example iteration tags.
pub fn export_training_set(
    game: &dyn GameRules,
    examples: &[TrainingExample],
    prefix: &Path,
) -> Result<()> {
    if examples.is_empty() {
        return Err(CoordinatorError::Artifact(
            "no examples to export".to_string(),
        ));
    }
    let (rows, cols) = game.board_shape();
    let n = examples.len();

    let states: Vec<f32> = examples.iter().flat_map(|e| e.state.iter().copied()).collect();
    let distributions: Vec<f32> = examples.iter().flat_map(|e| e.policy.iter().copied()).collect();
    let artifact = Artifact {
        states: Array::from_shape_vec((n, ENCODED_PLANES, rows, cols), states)
            .map_err(|e| CoordinatorError::Artifact(format!("states: {e}")))?,
        distributions: Array::from_shape_vec((n, game.action_size()), distributions)
            .map_err(|e| CoordinatorError::Artifact(format!("distributions: {e}")))?,
        outcomes: examples.iter().map(|e| e.value).collect(),
    };

    artifact
        .save(prefix)
        .map_err(|e| CoordinatorError::Artifact(format!("{}: {e:#}", prefix.display())))?;

    let recency: Array1<u32> = examples.iter().map(|e| e.recency).collect();
    write_npy(artifact_file(prefix, "recency"), &recency)
        .map_err(|e| CoordinatorError::Artifact(format!("recency: {e}")))?;

    log::info!("Exported {} training examples to {}", n, prefix.display());
    Ok(())
}

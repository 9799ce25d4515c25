use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use gridzero_mcts::{Evaluator, UniformEvaluator};

use crate::error::{NnError, Result};

/// Reference to the model a worker should evaluate leaves with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelHandle {
    /// No model trained yet: uniform priors and zero value
    Uniform,
    /// Traced TorchScript module on disk
    TorchScript(PathBuf),
}

impl ModelHandle {
    /// Model used to play `iteration`: the one trained after the previous
    /// iteration, or the uniform sentinel for iteration 0
    pub fn for_iteration(data_root: &Path, run: &str, iteration: u32) -> Self {
        match iteration.checked_sub(1) {
            None => ModelHandle::Uniform,
            Some(previous) => ModelHandle::TorchScript(model_path(data_root, run, previous)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ModelHandle::Uniform => None,
            ModelHandle::TorchScript(path) => Some(path),
        }
    }
}

impl FromStr for ModelHandle {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "uniform" | "random" => ModelHandle::Uniform,
            path => ModelHandle::TorchScript(PathBuf::from(path)),
        })
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::Uniform => write!(f, "uniform"),
            ModelHandle::TorchScript(path) => write!(f, "{}", path.display()),
        }
    }
}

/// `{data_root}/models/{run}/traced_{run}_iteration_{i}.pt`
pub fn model_path(data_root: &Path, run: &str, iteration: u32) -> PathBuf {
    data_root
        .join("models")
        .join(run)
        .join(format!("traced_{run}_iteration_{iteration}.pt"))
}

/// Block until the model behind `handle` exists on disk.
///
/// Returns immediately for the uniform sentinel. `timeout` of `None` waits
/// forever.
pub fn wait_for_model(
    handle: &ModelHandle,
    poll_interval: Duration,
    timeout: Option<Duration>,
) -> Result<()> {
    let Some(path) = handle.path() else {
        return Ok(());
    };

    let start = Instant::now();
    let mut announced = false;
    while !path.is_file() {
        let waited = start.elapsed();
        if timeout.is_some_and(|limit| waited >= limit) {
            return Err(NnError::ModelTimeout {
                path: path.to_path_buf(),
                waited,
            });
        }
        if !announced {
            log::info!("Waiting for model {}", path.display());
            announced = true;
        }
        thread::sleep(poll_interval);
    }
    Ok(())
}

/// Build the leaf evaluator for a model handle
pub fn load_evaluator(handle: &ModelHandle) -> Result<Box<dyn Evaluator>> {
    match handle {
        ModelHandle::Uniform => Ok(Box::new(UniformEvaluator)),
        #[cfg(feature = "torch")]
        ModelHandle::TorchScript(path) => {
            let model = crate::torch::NnModel::load(path, tch::Device::cuda_if_available())?;
            log::info!("Loaded TorchScript model {}", path.display());
            Ok(Box::new(crate::torch::TorchEvaluator::new(model)))
        }
        #[cfg(not(feature = "torch"))]
        ModelHandle::TorchScript(path) => Err(NnError::TorchUnavailable(path.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentinels() {
        assert_eq!("uniform".parse::<ModelHandle>().unwrap(), ModelHandle::Uniform);
        assert_eq!("random".parse::<ModelHandle>().unwrap(), ModelHandle::Uniform);
        assert_eq!(
            "models/a.pt".parse::<ModelHandle>().unwrap(),
            ModelHandle::TorchScript(PathBuf::from("models/a.pt"))
        );
    }

    #[test]
    fn test_handle_for_iteration() {
        let root = Path::new("/data");
        assert_eq!(ModelHandle::for_iteration(root, "c4", 0), ModelHandle::Uniform);
        assert_eq!(
            ModelHandle::for_iteration(root, "c4", 3),
            ModelHandle::TorchScript(PathBuf::from(
                "/data/models/c4/traced_c4_iteration_2.pt"
            ))
        );
    }

    #[test]
    fn test_wait_for_existing_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.pt");
        std::fs::write(&path, b"").unwrap();

        let handle = ModelHandle::TorchScript(path);
        wait_for_model(&handle, Duration::from_millis(1), Some(Duration::ZERO)).unwrap();
        wait_for_model(&ModelHandle::Uniform, Duration::from_millis(1), None).unwrap();
    }

    #[test]
    fn test_wait_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ModelHandle::TorchScript(dir.path().join("missing.pt"));
        let result = wait_for_model(
            &handle,
            Duration::from_millis(5),
            Some(Duration::from_millis(20)),
        );
        assert!(matches!(result, Err(NnError::ModelTimeout { .. })));
    }

    #[cfg(not(feature = "torch"))]
    #[test]
    fn test_torchscript_needs_feature() {
        let result = load_evaluator(&ModelHandle::TorchScript(PathBuf::from("x.pt")));
        assert!(matches!(result, Err(NnError::TorchUnavailable(_))));
    }

    #[test]
    fn test_uniform_evaluator_loads() {
        assert!(load_evaluator(&ModelHandle::Uniform).is_ok());
    }
}

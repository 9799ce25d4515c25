use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use gridzero_core::{GameRules, ENCODED_PLANES};
use ndarray::{Array, Array1, Array2, Array4, ArrayBase, Axis, Data, Dimension};
use ndarray_npy::{read_npy, write_npy, WritableElement};

use crate::data::{SelfPlayBatch, TrainingExample};

/// File kinds making up one artifact
pub const ARTIFACT_KINDS: [&str; 3] = ["states", "distributions", "outcomes"];

/// File for one part of an artifact: `{prefix}_{kind}.npy`
pub fn artifact_file(prefix: &Path, kind: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!("_{kind}.npy"));
    PathBuf::from(name)
}

/// True once all three files of an artifact exist
pub fn artifact_exists(prefix: &Path) -> bool {
    ARTIFACT_KINDS.iter().all(|kind| artifact_file(prefix, kind).is_file())
}

/// Save a self-play batch to NPY files
///
/// Creates three separate files:
/// - `{prefix}_states.npy`: (N, 3, rows, cols) encoded positions
/// - `{prefix}_distributions.npy`: (N, A) target distributions
/// - `{prefix}_outcomes.npy`: (N,) value targets
pub fn save_artifact(game: &dyn GameRules, batch: &SelfPlayBatch, prefix: &Path) -> Result<()> {
    Artifact::from_batch(game, batch)?.save(prefix)
}

/// A loaded artifact triple
#[derive(Debug, Clone)]
pub struct Artifact {
    pub states: Array4<f32>,
    pub distributions: Array2<f32>,
    pub outcomes: Array1<f32>,
}

impl Artifact {
    /// Encode a batch into the on-disk layout
    pub fn from_batch(game: &dyn GameRules, batch: &SelfPlayBatch) -> Result<Self> {
        if batch.is_empty() {
            bail!("Cannot save empty self-play batch");
        }

        let (rows, cols) = game.board_shape();
        let n = batch.len();

        let states: Vec<f32> = batch.states.iter().flat_map(|s| game.encode(s)).collect();
        let states: Array4<f32> = Array::from_shape_vec((n, ENCODED_PLANES, rows, cols), states)?;

        let distributions: Vec<f32> = batch
            .distributions
            .iter()
            .flat_map(|d| d.iter().copied())
            .collect();
        let distributions: Array2<f32> =
            Array::from_shape_vec((n, game.action_size()), distributions)?;

        let outcomes: Array1<f32> = Array::from_vec(batch.outcomes.clone());
        if outcomes.len() != n {
            bail!("Batch has {} states but {} outcomes", n, outcomes.len());
        }

        Ok(Self {
            states,
            distributions,
            outcomes,
        })
    }

    /// Write the three files. Each is written to a `.tmp` sibling and renamed
    /// into place, outcomes last, so a complete outcomes file implies a
    /// complete artifact.
    pub fn save(&self, prefix: &Path) -> Result<()> {
        if let Some(parent) = prefix.parent() {
            fs::create_dir_all(parent)?;
        }
        write_npy_atomic(&artifact_file(prefix, "states"), &self.states)?;
        write_npy_atomic(&artifact_file(prefix, "distributions"), &self.distributions)?;
        write_npy_atomic(&artifact_file(prefix, "outcomes"), &self.outcomes)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Flatten into training examples tagged with `recency`
    pub fn into_examples(self, recency: u32) -> Vec<TrainingExample> {
        self.states
            .axis_iter(Axis(0))
            .zip(self.distributions.axis_iter(Axis(0)))
            .zip(self.outcomes.iter())
            .map(|((state, dist), &value)| {
                TrainingExample::new(
                    state.iter().copied().collect(),
                    dist.to_vec(),
                    value,
                    recency,
                )
            })
            .collect()
    }
}

fn write_npy_atomic<A, D>(path: &Path, array: &ArrayBase<A, D>) -> Result<()>
where
    A: Data,
    A::Elem: WritableElement,
    D: Dimension,
{
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    write_npy(&tmp, array)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load an artifact triple and check that its parts line up
pub fn load_artifact(prefix: &Path) -> Result<Artifact> {
    let states: Array4<f32> = read_npy(artifact_file(prefix, "states"))?;
    let distributions: Array2<f32> = read_npy(artifact_file(prefix, "distributions"))?;
    let outcomes: Array1<f32> = read_npy(artifact_file(prefix, "outcomes"))?;

    let n = outcomes.len();
    if states.len_of(Axis(0)) != n || distributions.len_of(Axis(0)) != n {
        bail!(
            "Mismatched artifact lengths at {}: states {}, distributions {}, outcomes {}",
            prefix.display(),
            states.len_of(Axis(0)),
            distributions.len_of(Axis(0)),
            n
        );
    }

    Ok(Artifact {
        states,
        distributions,
        outcomes,
    })
}

/// Layout of artifacts under a data root:
/// `{root}/games/{run}/{group}/{task}/{run}_iteration_{i}_{kind}.npy`
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub data_root: PathBuf,
    pub run: String,
    pub workers_per_group: usize,
}

impl ArtifactPaths {
    pub fn new(
        data_root: impl Into<PathBuf>,
        run: impl Into<String>,
        num_workers: usize,
        num_groups: usize,
    ) -> Self {
        let groups = num_groups.max(1);
        Self {
            data_root: data_root.into(),
            run: run.into(),
            workers_per_group: (num_workers / groups).max(1),
        }
    }

    pub fn group_of(&self, task: usize) -> usize {
        task / self.workers_per_group
    }

    /// Prefix to pass to [`save_artifact`] / [`load_artifact`]
    pub fn prefix(&self, task: usize, iteration: u32) -> PathBuf {
        self.data_root
            .join("games")
            .join(&self.run)
            .join(self.group_of(task).to_string())
            .join(task.to_string())
            .join(format!("{}_iteration_{}", self.run, iteration))
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gridzero_core::{ConnectK, GameRules, Pentago};
use gridzero_mcts::MctsConfig;
use gridzero_selfplay::{ArtifactPaths, SelfPlayConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, Result};
use crate::source::FsSource;

/// Which game a run plays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameKind {
    ConnectK { rows: usize, cols: usize, k: usize },
    Pentago,
}

impl GameKind {
    pub fn build(&self) -> Result<Box<dyn GameRules>> {
        Ok(match *self {
            GameKind::ConnectK { rows, cols, k } => Box::new(ConnectK::new(rows, cols, k)?),
            GameKind::Pentago => Box::new(Pentago::new()),
        })
    }
}

impl Default for GameKind {
    fn default() -> Self {
        GameKind::ConnectK {
            rows: 6,
            cols: 7,
            k: 4,
        }
    }
}

/// Controller side of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub run_name: String,
    pub data_root: PathBuf,
    pub game: GameKind,
    pub num_iterations: u32,
    pub num_workers: usize,
    pub num_groups: usize,

    /// Sleep between polling rounds
    pub poll_interval_ms: u64,

    /// How long stragglers get once more than half the workers are done
    pub straggler_timeout_ms: u64,

    /// How long an unreadable artifact must stay unchanged before it counts
    /// as malformed
    pub artifact_settle_ms: u64,

    /// Tag examples with `iteration + 1` instead of a constant 1
    pub linear_weighting: bool,

    /// Number of past iterations kept for training
    pub replay_window: usize,

    /// Remove killed workers from the rosters of later iterations
    pub drop_killed_workers: bool,

    /// Write the replay window under `training_prefix` after each iteration
    pub export_training_data: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            run_name: "c4".to_string(),
            data_root: PathBuf::from("data"),
            game: GameKind::default(),
            num_iterations: 25,
            num_workers: 1,
            num_groups: 1,
            poll_interval_ms: 10_000,
            straggler_timeout_ms: 600_000,
            artifact_settle_ms: 30_000,
            linear_weighting: true,
            replay_window: 10,
            drop_killed_workers: true,
            export_training_data: true,
        }
    }
}

impl CoordinatorConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_workers(self.num_workers, self.num_groups)?;
        if self.replay_window == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "replay_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn straggler_timeout(&self) -> Duration {
        Duration::from_millis(self.straggler_timeout_ms)
    }

    pub fn artifact_settle_time(&self) -> Duration {
        Duration::from_millis(self.artifact_settle_ms)
    }

    /// Filesystem source over this run's artifact layout
    pub fn fs_source(&self) -> FsSource {
        FsSource::new(self.artifact_paths()).with_settle_time(self.artifact_settle_time())
    }

    /// Recency tag attached to every example collected in `iteration`
    pub fn recency_tag(&self, iteration: u32) -> u32 {
        if self.linear_weighting {
            iteration + 1
        } else {
            1
        }
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(
            &self.data_root,
            &self.run_name,
            self.num_workers,
            self.num_groups,
        )
    }

    /// `{data_root}/training/{run}/{run}_iteration_{i}`
    pub fn training_prefix(&self, iteration: u32) -> PathBuf {
        self.data_root
            .join("training")
            .join(&self.run_name)
            .join(format!("{}_iteration_{}", self.run_name, iteration))
    }
}

/// Self-play worker side of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub run_name: String,
    pub data_root: PathBuf,
    pub game: GameKind,
    pub num_iterations: u32,
    pub num_workers: usize,
    pub num_groups: usize,

    /// Games per iteration, and for iteration 0
    pub games_per_iteration: usize,
    pub initial_games_per_iteration: usize,

    /// Search iterations per move, and for iteration 0
    pub search_iterations: u32,
    pub initial_search_iterations: u32,

    /// Search settings; `num_iterations` is overridden per iteration
    pub mcts: MctsConfig,
    pub selfplay: SelfPlayConfig,

    /// Play every iteration with this model (e.g. "uniform") instead of
    /// waiting for the trainer's output
    pub fixed_model: Option<String>,

    pub model_poll_interval_ms: u64,
    pub model_timeout_ms: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            run_name: "c4".to_string(),
            data_root: PathBuf::from("data"),
            game: GameKind::default(),
            num_iterations: 25,
            num_workers: 1,
            num_groups: 1,
            games_per_iteration: 5,
            initial_games_per_iteration: 10,
            search_iterations: 512,
            initial_search_iterations: 2048,
            mcts: MctsConfig::default().with_dirichlet_noise(0.5, 0.25),
            selfplay: SelfPlayConfig::default(),
            fixed_model: None,
            model_poll_interval_ms: 1_000,
            model_timeout_ms: None,
        }
    }
}

impl WorkerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let config: Self = read_json(path)?;
        validate_workers(config.num_workers, config.num_groups)?;
        Ok(config)
    }

    pub fn games_for(&self, iteration: u32) -> usize {
        if iteration == 0 {
            self.initial_games_per_iteration
        } else {
            self.games_per_iteration
        }
    }

    /// Search settings used while playing `iteration`
    pub fn mcts_for(&self, iteration: u32) -> MctsConfig {
        let n = if iteration == 0 {
            self.initial_search_iterations
        } else {
            self.search_iterations
        };
        self.mcts.clone().with_iterations(n)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(
            &self.data_root,
            &self.run_name,
            self.num_workers,
            self.num_groups,
        )
    }

    pub fn model_poll_interval(&self) -> Duration {
        Duration::from_millis(self.model_poll_interval_ms)
    }

    pub fn model_timeout(&self) -> Option<Duration> {
        self.model_timeout_ms.map(Duration::from_millis)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn validate_workers(num_workers: usize, num_groups: usize) -> Result<()> {
    if num_workers == 0 || num_groups == 0 || num_groups > num_workers {
        return Err(CoordinatorError::InvalidConfig(format!(
            "need 1 <= num_groups <= num_workers, got {num_groups} groups for {num_workers} workers"
        )));
    }
    Ok(())
}

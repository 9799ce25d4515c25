//! Fan-out/fan-in collection of self-play data.
//!
//! Workers play one iteration each and deliver an artifact, either as npy
//! files under a shared data root or over an in-process channel. The
//! coordinator polls them, cuts off stragglers once more than half are done,
//! and keeps a sliding window of recent iterations for the trainer.
//!
//! # Example
//!
//! ```no_run
//! use gridzero_coordinator::{ChannelSource, Coordinator, CoordinatorConfig, WorkerConfig};
//! use gridzero_coordinator::spawn_local_workers;
//!
//! # fn main() -> gridzero_coordinator::Result<()> {
//! let config = CoordinatorConfig { num_workers: 4, ..Default::default() };
//! let workers = WorkerConfig {
//!     num_workers: 4,
//!     fixed_model: Some("uniform".to_string()),
//!     ..Default::default()
//! };
//!
//! let (sender, source) = ChannelSource::unbounded();
//! let handles = spawn_local_workers(&workers, &[0, 1, 2, 3], &sender)?;
//! drop(sender);
//!
//! let mut coordinator = Coordinator::new(config, source)?;
//! let reports = coordinator.run()?;
//! println!("{} iterations collected", reports.len());
//! # drop(handles);
//! # Ok(())
//! # }
//! ```

mod collate;
mod config;
mod error;
mod export;
mod record;
mod replay;
mod source;
mod worker;

pub use collate::{collect_iteration, IterationReport};
pub use config::{CoordinatorConfig, GameKind, WorkerConfig};
pub use error::{CoordinatorError, Result};
pub use export::export_training_set;
pub use record::{WorkerRecord, WorkerStatus};
pub use replay::ReplayWindow;
pub use source::{ChannelSource, Completion, CompletionSource, FsSource, WorkerMessage};
pub use worker::{run_worker, spawn_local_workers, FsOutput, WorkerOutput};

use gridzero_core::GameRules;

/// Multi-iteration driver over a fixed pool of worker tasks
pub struct Coordinator<S> {
    config: CoordinatorConfig,
    game: Box<dyn GameRules>,
    source: S,
    roster: Vec<usize>,
    replay: ReplayWindow,
    iteration: u32,
}

impl<S: CompletionSource> Coordinator<S> {
    pub fn new(config: CoordinatorConfig, source: S) -> Result<Self> {
        config.validate()?;
        let game = config.game.build()?;
        Ok(Self {
            roster: (0..config.num_workers).collect(),
            replay: ReplayWindow::new(config.replay_window),
            iteration: 0,
            game,
            source,
            config,
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Task ids expected in the next iteration
    pub fn roster(&self) -> &[usize] {
        &self.roster
    }

    pub fn replay(&self) -> &ReplayWindow {
        &self.replay
    }

    /// Iteration the next call to [`Coordinator::run_iteration`] collects
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Collect the next iteration, update the roster and replay window, and
    /// export the window if configured
    pub fn run_iteration(&mut self) -> Result<IterationReport> {
        let iteration = self.iteration;
        let report = collect_iteration(&mut self.source, &self.config, iteration, &self.roster);

        if self.config.drop_killed_workers && !report.killed.is_empty() {
            self.roster.retain(|id| !report.killed.contains(id));
            log::warn!(
                "Dropped {} killed workers, {} remain",
                report.killed.len(),
                self.roster.len()
            );
        }

        self.replay.push(iteration, report.examples.clone());
        if self.config.export_training_data && !self.replay.is_empty() {
            export_training_set(
                self.game.as_ref(),
                &self.replay.examples(),
                &self.config.training_prefix(iteration),
            )?;
        }

        log::info!(
            "Iteration {} done: replay window holds {} samples over {} iterations",
            iteration,
            self.replay.len(),
            self.replay.num_iterations()
        );

        self.iteration += 1;
        Ok(report)
    }

    /// Run the remaining iterations. Stops early once no workers are left.
    pub fn run(&mut self) -> Result<Vec<IterationReport>> {
        let mut reports = Vec::new();
        while self.iteration < self.config.num_iterations {
            if self.roster.is_empty() {
                log::warn!("No workers left before iteration {}", self.iteration);
                break;
            }
            reports.push(self.run_iteration()?);
        }
        Ok(reports)
    }
}

use std::str::FromStr;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use gridzero_core::GameRules;
use gridzero_mcts::UctPolicy;
use gridzero_nn::{load_evaluator, wait_for_model, ModelHandle};
use gridzero_selfplay::{run_iteration, Artifact, ArtifactPaths};

use crate::config::WorkerConfig;
use crate::error::{CoordinatorError, Result};
use crate::source::WorkerMessage;

/// Where a worker hands its finished iterations
pub trait WorkerOutput {
    fn deliver(
        &mut self,
        task_id: usize,
        iteration: u32,
        payload: std::result::Result<Artifact, String>,
    ) -> Result<()>;
}

/// Writes artifact triples for a filesystem-polling coordinator
pub struct FsOutput {
    paths: ArtifactPaths,
}

impl FsOutput {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }
}

impl WorkerOutput for FsOutput {
    fn deliver(
        &mut self,
        task_id: usize,
        iteration: u32,
        payload: std::result::Result<Artifact, String>,
    ) -> Result<()> {
        // A failed iteration leaves no files; the coordinator times it out
        let Ok(artifact) = payload else {
            return Ok(());
        };
        let prefix = self.paths.prefix(task_id, iteration);
        artifact
            .save(&prefix)
            .map_err(|e| CoordinatorError::Artifact(format!("{}: {e:#}", prefix.display())))?;
        log::info!("Wrote {} samples to {}", artifact.len(), prefix.display());
        Ok(())
    }
}

impl WorkerOutput for Sender<WorkerMessage> {
    fn deliver(
        &mut self,
        task_id: usize,
        iteration: u32,
        payload: std::result::Result<Artifact, String>,
    ) -> Result<()> {
        self.send(WorkerMessage {
            task_id,
            iteration,
            payload,
        })
        .map_err(|_| CoordinatorError::Disconnected { task_id, iteration })
    }
}

/// Run every iteration of one self-play worker.
///
/// Each iteration waits for the model trained on the previous one (or uses
/// `fixed_model`), plays its games and delivers the samples. A failed
/// iteration is reported to `output` and ends the worker.
pub fn run_worker<O: WorkerOutput + ?Sized>(
    config: &WorkerConfig,
    task_id: usize,
    output: &mut O,
) -> Result<()> {
    let game = config.game.build()?;
    let paths = config.artifact_paths();
    log::info!(
        "Worker {} in group {} starting {} iterations",
        task_id,
        paths.group_of(task_id),
        config.num_iterations
    );

    for iteration in 0..config.num_iterations {
        log::info!("Worker {} iteration {}", task_id, iteration);
        match play_iteration(config, game.as_ref(), iteration) {
            Ok(artifact) => output.deliver(task_id, iteration, Ok(artifact))?,
            Err(e) => {
                log::error!("Worker {} failed iteration {}: {}", task_id, iteration, e);
                output.deliver(task_id, iteration, Err(e.to_string()))?;
                return Err(e);
            }
        }
    }
    Ok(())
}

fn play_iteration(config: &WorkerConfig, game: &dyn GameRules, iteration: u32) -> Result<Artifact> {
    let handle = match &config.fixed_model {
        Some(model) => ModelHandle::from_str(model).unwrap_or_else(|never| match never {}),
        None => ModelHandle::for_iteration(&config.data_root, &config.run_name, iteration),
    };
    wait_for_model(&handle, config.model_poll_interval(), config.model_timeout())?;
    let evaluator = load_evaluator(&handle)?;
    log::debug!("Playing iteration {} with model {}", iteration, handle);

    let policy = UctPolicy::new(evaluator, config.mcts_for(iteration));
    let batch = run_iteration(
        game,
        [&policy, &policy],
        config.games_for(iteration),
        &config.selfplay,
    )
    .map_err(|e| CoordinatorError::SelfPlay(format!("{e:#}")))?;

    Artifact::from_batch(game, &batch).map_err(|e| CoordinatorError::Artifact(format!("{e:#}")))
}

/// Start one thread per task id, each running [`run_worker`] and reporting
/// through a clone of `sender`
pub fn spawn_local_workers(
    config: &WorkerConfig,
    task_ids: &[usize],
    sender: &Sender<WorkerMessage>,
) -> Result<Vec<JoinHandle<Result<()>>>> {
    task_ids
        .iter()
        .map(|&task_id| {
            let config = config.clone();
            let mut sender = sender.clone();
            thread::Builder::new()
                .name(format!("selfplay-{task_id}"))
                .spawn(move || run_worker(&config, task_id, &mut sender))
                .map_err(CoordinatorError::from)
        })
        .collect()
}

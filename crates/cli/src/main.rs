use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gridzero_coordinator::{
    run_worker, spawn_local_workers, ChannelSource, Coordinator, CoordinatorConfig, FsOutput,
    GameKind, WorkerConfig,
};
use gridzero_core::GameRules;
use gridzero_mcts::{MctsConfig, UctPolicy, UniformPolicy};
use gridzero_nn::{load_evaluator, ModelHandle};
use gridzero_selfplay::{
    evaluate_agents, run_iteration, save_artifact, Agent, PolicyAgent, SelfPlayConfig,
};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "gridzero", version, about = "Self-play data generation for grid games")]
struct Cli {
    /// Log level spec, overridden by RUST_LOG
    #[arg(long, global = true)]
    log: Option<String>,

    /// Write rotated log files to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one self-play worker task, writing artifacts under the data root
    Worker {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        task_id: usize,
    },
    /// Collect worker artifacts iteration by iteration
    Coordinate {
        #[arg(long)]
        config: PathBuf,
        /// Run the workers in-process from this worker config
        #[arg(long)]
        local_workers: Option<PathBuf>,
    },
    /// Play a batch of games and save one artifact
    Selfplay {
        #[command(flatten)]
        game: GameArgs,
        #[command(flatten)]
        search: SearchArgs,
        #[arg(long, default_value_t = 10)]
        games: usize,
        /// Output prefix for the three npy files
        #[arg(long)]
        out: PathBuf,
    },
    /// Pit a search agent against a random one
    Arena {
        #[command(flatten)]
        game: GameArgs,
        #[command(flatten)]
        search: SearchArgs,
        #[arg(long, default_value_t = 20)]
        games: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GameChoice {
    ConnectFour,
    ConnectK,
    Pentago,
}

#[derive(Args, Debug)]
struct GameArgs {
    #[arg(long, value_enum, default_value = "connect-four")]
    game: GameChoice,
    #[arg(long, default_value_t = 6)]
    rows: usize,
    #[arg(long, default_value_t = 7)]
    cols: usize,
    #[arg(long, default_value_t = 4)]
    k: usize,
}

impl GameArgs {
    fn build(&self) -> Result<Box<dyn GameRules>> {
        let kind = match self.game {
            GameChoice::ConnectFour => GameKind::default(),
            GameChoice::ConnectK => GameKind::ConnectK {
                rows: self.rows,
                cols: self.cols,
                k: self.k,
            },
            GameChoice::Pentago => GameKind::Pentago,
        };
        Ok(kind.build()?)
    }
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search iterations per move
    #[arg(long, default_value_t = 200)]
    iterations: u32,
    /// "uniform" or a TorchScript model path
    #[arg(long, default_value = "uniform")]
    model: ModelHandle,
}

impl SearchArgs {
    fn policy(&self, noise: bool) -> Result<UctPolicy<Box<dyn gridzero_mcts::Evaluator>>> {
        let evaluator = load_evaluator(&self.model)
            .with_context(|| format!("Failed to load model {}", self.model))?;
        let mut config = MctsConfig::default().with_iterations(self.iterations);
        if noise {
            config = config.with_dirichlet_noise(0.5, 0.25);
        }
        Ok(UctPolicy::new(evaluator, config))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = logging::setup_logging(cli.log.as_deref(), cli.log_dir.as_deref())?;

    match cli.command {
        Command::Worker { config, task_id } => {
            let config = WorkerConfig::from_json_file(&config)
                .with_context(|| format!("Failed to read {}", config.display()))?;
            let mut output = FsOutput::new(config.artifact_paths());
            run_worker(&config, task_id, &mut output)?;
        }
        Command::Coordinate {
            config,
            local_workers,
        } => {
            let config = CoordinatorConfig::from_json_file(&config)
                .with_context(|| format!("Failed to read {}", config.display()))?;
            coordinate(config, local_workers)?;
        }
        Command::Selfplay {
            game,
            search,
            games,
            out,
        } => {
            let game = game.build()?;
            let policy = search.policy(true)?;
            let batch = run_iteration(
                game.as_ref(),
                [&policy, &policy],
                games,
                &SelfPlayConfig::default(),
            )?;
            save_artifact(game.as_ref(), &batch, &out)?;
            log::info!("Saved {} samples to {}", batch.len(), out.display());
        }
        Command::Arena {
            game,
            search,
            games,
        } => {
            let game = game.build()?;
            let searcher = PolicyAgent::new(search.policy(false)?, 0.0);
            let random = PolicyAgent::new(UniformPolicy, 1.0);
            let stats = evaluate_agents(
                game.as_ref(),
                &searcher as &dyn Agent,
                &random as &dyn Agent,
                games,
            )?;
            println!(
                "search vs random: {} wins, {} losses, {} draws (score {:.3})",
                stats.wins,
                stats.losses,
                stats.draws,
                stats.score()
            );
        }
    }

    Ok(())
}

fn coordinate(config: CoordinatorConfig, local_workers: Option<PathBuf>) -> Result<()> {
    let Some(worker_config) = local_workers else {
        let source = config.fs_source();
        Coordinator::new(config, source)?.run()?;
        return Ok(());
    };

    let workers = WorkerConfig::from_json_file(&worker_config)
        .with_context(|| format!("Failed to read {}", worker_config.display()))?;
    let task_ids: Vec<usize> = (0..config.num_workers).collect();
    let (sender, source) = ChannelSource::unbounded();
    let handles = spawn_local_workers(&workers, &task_ids, &sender)?;
    drop(sender);

    Coordinator::new(config, source)?.run()?;

    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("Local worker stopped with an error: {e}"),
            Err(_) => log::warn!("Local worker panicked"),
        }
    }
    Ok(())
}

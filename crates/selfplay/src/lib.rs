//! Self-play data generation for iterative reinforcement learning
//!
//! This crate provides functionality for:
//! - Playing self-play games between two policies
//! - Recording symmetric variants of positions and target distributions
//! - Converting games to training examples
//! - Saving and loading NPY artifacts for the external trainer
//! - Head-to-head matches between agents
//!
//! # Example
//!
//! ```no_run
//! use gridzero_core::ConnectK;
//! use gridzero_mcts::{MctsConfig, UctPolicy, UniformEvaluator};
//! use gridzero_selfplay::{run_iteration, save_artifact, SelfPlayConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let game = ConnectK::connect_four();
//!
//! // Configure search for self-play
//! let config = MctsConfig::default()
//!     .with_iterations(200)
//!     .with_dirichlet_noise(0.3, 0.25);
//! let policy = UctPolicy::new(UniformEvaluator, config);
//!
//! // Play ten games
//! let batch = run_iteration(&game, [&policy, &policy], 10, &SelfPlayConfig::default())?;
//! println!("Generated {} samples", batch.len());
//!
//! // Save to files
//! save_artifact(&game, &batch, "selfplay_data".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod arena;
mod config;
mod data;
mod game;
pub mod storage;

// Re-export public API
pub use arena::{evaluate_agents, play_match, Agent, MatchStats, PolicyAgent};
pub use config::SelfPlayConfig;
pub use data::{GameRecord, GameResult, SelfPlayBatch, TrainingExample};
pub use game::{play_game, run_iteration, sharpen};
pub use storage::{load_artifact, save_artifact, Artifact, ArtifactPaths};

// Module declarations
mod backup;
mod config;
mod dirichlet;
mod error;
mod evaluation;
mod expansion;
mod mcts;
mod policy;
mod search_result;
mod selection;
mod tree;

// Public exports
pub use config::{FirstPlayUrgency, MctsConfig};
pub use error::{MctsError, Result};
pub use evaluation::{
    mask_and_normalize, softmax_legal, uniform_over_legal, Evaluation, Evaluator,
    RolloutEvaluator, UniformEvaluator,
};
pub use mcts::Mcts;
pub use policy::{EvaluatorPolicy, Policy, PolicyOutput, RolloutPolicy, UctPolicy, UniformPolicy};
pub use search_result::SearchResult;
pub use tree::{MctsNode, MctsTree, NodeId};

use gridzero_core::{GameRules, GameState};

use crate::backup::backup;
use crate::config::MctsConfig;
use crate::error::{MctsError, Result};
use crate::evaluation::Evaluator;
use crate::expansion::expand_and_evaluate;
use crate::search_result::SearchResult;
use crate::selection::select;
use crate::tree::{MctsTree, NodeId};

/// Monte Carlo Tree Search with UCT selection and evaluator priors
pub struct Mcts {
    tree: MctsTree,
}

impl Mcts {
    /// Create a new MCTS instance
    pub fn new() -> Self {
        Self {
            tree: MctsTree::new(),
        }
    }

    /// Run a search from `state`
    ///
    /// The root is expanded before the first iteration, so every iteration
    /// adds exactly one visit to a root edge.
    pub fn search<E: Evaluator + ?Sized>(
        &mut self,
        game: &dyn GameRules,
        state: &GameState,
        evaluator: &E,
        config: &MctsConfig,
    ) -> Result<SearchResult> {
        if game.is_terminal(state) {
            return Err(MctsError::TerminalPosition);
        }

        // 1. Initialize and expand root
        let root_id = self.tree.initialize_root(game, state.clone())?;
        expand_and_evaluate(&mut self.tree, game, root_id, evaluator, config)?;

        // 2. Run iterations
        for _ in 0..config.num_iterations {
            let leaf_id = select(&mut self.tree, game, root_id, config.c_uct)?;
            let value = expand_and_evaluate(&mut self.tree, game, leaf_id, evaluator, config)?;
            backup(&mut self.tree, leaf_id, value)?;
        }

        // 3. Extract results
        let result = self.create_search_result(root_id, config)?;
        log::debug!(
            "Search finished: {} iterations, {} nodes, best action {:?}, value {:.3}",
            result.num_iterations,
            self.tree.size(),
            result.best_action,
            result.value
        );
        Ok(result)
    }

    /// Create search result from root edge statistics
    fn create_search_result(&self, root_id: NodeId, config: &MctsConfig) -> Result<SearchResult> {
        let root = self.tree.node(root_id)?;
        let mask = root.mask.as_ref().ok_or(MctsError::RootNotInitialized)?;

        let root_visit_counts: Vec<(usize, u32)> = mask
            .iter_legal()
            .map(|a| (a, root.visit_count[a]))
            .collect();

        let mut best: Option<(usize, u32)> = None;
        for &(action, visits) in &root_visit_counts {
            match best {
                Some((_, most)) if visits <= most => {}
                _ => best = Some((action, visits)),
            }
        }
        let best_action = best.map(|(a, _)| a);

        let total = root.total_visits();
        let policy = if total > 0 {
            root.visit_count
                .iter()
                .map(|&v| v as f32 / total as f32)
                .collect()
        } else {
            root.priors.clone()
        };

        let value = match best_action {
            Some(a) => root.child_q(a),
            None => root.value_estimate.unwrap_or(0.0),
        };

        Ok(SearchResult {
            best_action,
            policy,
            value,
            num_iterations: config.num_iterations,
            root_visit_counts,
        })
    }

    /// Reset the tree (clear all nodes)
    pub fn reset(&mut self) {
        self.tree.clear();
    }

    /// Get the number of nodes in the tree
    pub fn tree_size(&self) -> usize {
        self.tree.size()
    }

    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }
}

impl Default for Mcts {
    fn default() -> Self {
        Self::new()
    }
}

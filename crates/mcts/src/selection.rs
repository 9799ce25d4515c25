use gridzero_core::GameRules;

use crate::error::{MctsError, Result};
use crate::tree::{MctsNode, MctsTree, NodeId};

/// Select a leaf node to evaluate using the UCT score.
///
/// Traverses the tree from root, following the best-scoring edge until
/// reaching an unexpanded or terminal node. Children are created lazily on
/// the way down.
pub fn select(
    tree: &mut MctsTree,
    game: &dyn GameRules,
    root_id: NodeId,
    c_uct: f32,
) -> Result<NodeId> {
    let mut current_id = root_id;

    loop {
        let node = tree.node(current_id)?;

        // Stop at leaf or terminal
        if !node.is_expanded || node.is_terminal {
            return Ok(current_id);
        }

        let action = best_action(node, c_uct)?;
        current_id = tree.child_or_insert(game, current_id, action)?;
    }
}

/// Legal action with the highest UCT score; ties go to the lowest index
pub fn best_action(node: &MctsNode, c_uct: f32) -> Result<usize> {
    let mask = node.mask.as_ref().ok_or(MctsError::TerminalPosition)?;
    let sqrt_total = (1.0 + node.total_visits() as f32).sqrt();

    let mut best: Option<(usize, f32)> = None;
    for action in mask.iter_legal() {
        let score = uct_score(node, action, sqrt_total, c_uct);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((action, score)),
        }
    }

    best.map(|(a, _)| a).ok_or(MctsError::NoLegalMoves)
}

/// Calculate the UCT score for an edge
///
/// score(a) = Q(a) + c * U(a)
///
/// Where:
/// - Q(a) = W(a) / (1 + N(a))
/// - U(a) = sqrt(1 + sum_b N(b)) * P(a) / (1 + N(a))
fn uct_score(node: &MctsNode, action: usize, sqrt_total: f32, c_uct: f32) -> f32 {
    node.child_q(action) + c_uct * node.child_u(action, sqrt_total)
}

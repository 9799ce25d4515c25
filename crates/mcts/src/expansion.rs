use gridzero_core::GameRules;

use crate::config::{FirstPlayUrgency, MctsConfig};
use crate::dirichlet::mix_dirichlet_noise;
use crate::error::{MctsError, Result};
use crate::evaluation::{evaluate_leaf, mask_and_normalize, Evaluator};
use crate::tree::{MctsTree, NodeId};

/// Evaluate a leaf and expand it, returning the value for the leaf's player
/// to move.
///
/// Terminal leaves are scored with the exact game reward and never expanded.
pub fn expand_and_evaluate<E: Evaluator + ?Sized>(
    tree: &mut MctsTree,
    game: &dyn GameRules,
    leaf_id: NodeId,
    evaluator: &E,
    config: &MctsConfig,
) -> Result<f32> {
    let leaf = tree.node(leaf_id)?;

    if leaf.is_terminal {
        return Ok(game.rewards(&leaf.state)[leaf.state.player().index()]);
    }

    let evaluation = evaluate_leaf(game, &leaf.state, evaluator, config.symmetrize_evaluation)?;
    expand_with_priors(tree, leaf_id, &evaluation.priors, evaluation.value, config)?;
    Ok(evaluation.value)
}

/// Expand a node using precomputed priors and value.
///
/// Priors are masked to the legal actions and renormalised before being
/// stored. Root noise and first-play urgency seeding are applied here.
pub fn expand_with_priors(
    tree: &mut MctsTree,
    node_id: NodeId,
    priors: &[f32],
    value: f32,
    config: &MctsConfig,
) -> Result<()> {
    let seed = first_play_value(tree, node_id, value, config.first_play_urgency)?;
    let is_root = node_id == tree.root_id;

    let node = tree
        .nodes
        .get_mut(node_id)
        .ok_or(MctsError::InvalidNodeId(node_id))?;
    if node.is_terminal {
        return Err(MctsError::TerminalPosition);
    }
    if node.is_expanded {
        return Err(MctsError::AlreadyExpanded(node_id));
    }
    let mask = node.mask.as_ref().ok_or(MctsError::TerminalPosition)?;
    if mask.count() == 0 {
        return Err(MctsError::NoLegalMoves);
    }

    let mut stored = mask_and_normalize(priors, mask);
    if is_root && config.add_dirichlet_noise {
        mix_dirichlet_noise(
            &mut stored,
            mask,
            config.dirichlet_alpha,
            config.dirichlet_epsilon,
        )?;
    }

    let size = mask.len();
    node.total_value = mask
        .as_slice()
        .iter()
        .map(|&legal| if legal { seed } else { 0.0 })
        .collect();
    node.visit_count = vec![0; size];
    node.children = vec![None; size];
    node.priors = stored;
    node.value_estimate = Some(value);
    node.is_expanded = true;

    Ok(())
}

/// Initial total value given to every legal edge of a freshly expanded node
fn first_play_value(
    tree: &MctsTree,
    node_id: NodeId,
    value: f32,
    fpu: FirstPlayUrgency,
) -> Result<f32> {
    match fpu {
        FirstPlayUrgency::Zero => Ok(0.0),
        FirstPlayUrgency::ParentValue => Ok(value),
        FirstPlayUrgency::Equal => {
            let node = tree.node(node_id)?;
            let (Some(parent_id), Some(action)) = (node.parent, node.action) else {
                return Ok(value);
            };
            let parent = tree.node(parent_id)?;
            if !parent.is_expanded {
                return Ok(value);
            }
            let q = parent.child_q(action);
            if parent.state.player() == node.state.player() {
                Ok(q)
            } else {
                Ok(-q)
            }
        }
    }
}

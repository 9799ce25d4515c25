use crate::error::{MctsError, Result};
use crate::tree::{MctsTree, NodeId};

/// Backup a leaf value to the root
///
/// `value` is from the perspective of the player to move at the leaf. Each
/// ancestor records it on the edge that leads towards the leaf, signed for
/// the ancestor's own player to move. Players are compared directly rather
/// than alternating the sign, so games where a player moves twice in a row
/// are handled too.
pub fn backup(tree: &mut MctsTree, leaf_id: NodeId, value: f32) -> Result<()> {
    let leaf_player = tree.node(leaf_id)?.state.player();
    let mut current_id = leaf_id;

    loop {
        let node = tree.node(current_id)?;
        let (Some(parent_id), Some(action)) = (node.parent, node.action) else {
            return Ok(());
        };

        let parent = tree
            .nodes
            .get_mut(parent_id)
            .ok_or(MctsError::InvalidNodeId(parent_id))?;
        let signed = if parent.state.player() == leaf_player {
            value
        } else {
            -value
        };
        parent.visit_count[action] += 1;
        parent.total_value[action] += signed;

        current_id = parent_id;
    }
}

use gridzero_core::{ActionMask, GameRules, GameState};

use crate::error::{MctsError, Result};

/// Node ID in the arena-style tree
pub type NodeId = usize;

/// A single node in the UCT tree.
///
/// Statistics for the edges leaving this node are stored here, indexed by
/// action. A node's own visit count and total value therefore live in its
/// parent's arrays at `action`.
pub struct MctsNode {
    /// Game state at this node
    pub state: GameState,

    /// Action that led to this state (None for root)
    pub action: Option<usize>,

    /// Parent node ID
    pub parent: Option<NodeId>,

    /// Legal actions, None at terminal states
    pub mask: Option<ActionMask>,

    /// Whether this is a terminal state
    pub is_terminal: bool,

    /// Whether the child statistics have been initialised
    pub is_expanded: bool,

    /// Evaluator value for the player to move, once expanded
    pub value_estimate: Option<f32>,

    /// Child node per action, created on first traversal
    pub children: Vec<Option<NodeId>>,

    /// Prior probability per action (zero on illegal actions)
    pub priors: Vec<f32>,

    /// Sum of backed-up values per action, from this node's mover's view
    pub total_value: Vec<f32>,

    /// Visits per action
    pub visit_count: Vec<u32>,
}

impl MctsNode {
    fn new(
        game: &dyn GameRules,
        state: GameState,
        action: Option<usize>,
        parent: Option<NodeId>,
    ) -> Result<Self> {
        let is_terminal = game.is_terminal(&state);
        let mask = if is_terminal {
            None
        } else {
            Some(game.action_mask(&state)?)
        };
        Ok(Self {
            state,
            action,
            parent,
            mask,
            is_terminal,
            is_expanded: false,
            value_estimate: None,
            children: Vec::new(),
            priors: Vec::new(),
            total_value: Vec::new(),
            visit_count: Vec::new(),
        })
    }

    /// Create a new root node
    pub fn new_root(game: &dyn GameRules, state: GameState) -> Result<Self> {
        Self::new(game, state, None, None)
    }

    /// Create a new child node
    pub fn new_child(
        game: &dyn GameRules,
        state: GameState,
        action: usize,
        parent: NodeId,
    ) -> Result<Self> {
        Self::new(game, state, Some(action), Some(parent))
    }

    /// Total visits over all edges
    pub fn total_visits(&self) -> u32 {
        self.visit_count.iter().sum()
    }

    /// Average value of an edge; the +1 keeps unvisited edges finite
    pub fn child_q(&self, action: usize) -> f32 {
        self.total_value[action] / (1.0 + self.visit_count[action] as f32)
    }

    /// Exploration bonus of an edge
    pub fn child_u(&self, action: usize, sqrt_total: f32) -> f32 {
        sqrt_total * self.priors[action] / (1.0 + self.visit_count[action] as f32)
    }

    pub fn is_legal(&self, action: usize) -> bool {
        self.mask.as_ref().is_some_and(|m| m.is_legal(action))
    }
}

/// UCT tree using arena allocation
pub struct MctsTree {
    /// Arena of all nodes
    pub nodes: Vec<MctsNode>,

    /// Root node ID (usually 0)
    pub root_id: NodeId,
}

impl MctsTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024),
            root_id: 0,
        }
    }

    /// Initialize the tree with a root node
    pub fn initialize_root(&mut self, game: &dyn GameRules, state: GameState) -> Result<NodeId> {
        self.nodes.clear();
        let root = MctsNode::new_root(game, state)?;
        self.nodes.push(root);
        self.root_id = 0;
        Ok(self.root_id)
    }

    /// Add a new node and return its ID
    pub fn add_node(&mut self, node: MctsNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&MctsNode> {
        self.nodes.get(id).ok_or(MctsError::InvalidNodeId(id))
    }

    /// Child reached from `parent_id` by `action`, created if this is the
    /// first traversal of that edge
    pub fn child_or_insert(
        &mut self,
        game: &dyn GameRules,
        parent_id: NodeId,
        action: usize,
    ) -> Result<NodeId> {
        let parent = self.node(parent_id)?;
        if !parent.is_expanded {
            return Err(MctsError::InvalidNodeId(parent_id));
        }
        if !parent.is_legal(action) {
            return Err(gridzero_core::GameError::IllegalAction { action }.into());
        }
        if let Some(child_id) = parent.children[action] {
            return Ok(child_id);
        }

        let child_state = game.next_state(&parent.state, action)?;
        let child = MctsNode::new_child(game, child_state, action, parent_id)?;
        let child_id = self.add_node(child);
        self.nodes[parent_id].children[action] = Some(child_id);
        Ok(child_id)
    }

    /// Get the number of nodes in the tree
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Clear the tree
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl Default for MctsTree {
    fn default() -> Self {
        Self::new()
    }
}

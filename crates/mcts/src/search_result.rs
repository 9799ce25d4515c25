/// Result of a UCT search
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Most visited root action (first one on ties)
    pub best_action: Option<usize>,

    /// Visit distribution over the whole action space
    pub policy: Vec<f32>,

    /// Q of the most visited action, for the root's player to move
    pub value: f32,

    /// Number of iterations actually run
    pub num_iterations: u32,

    /// Visit counts for each legal root action: (action, visit_count)
    pub root_visit_counts: Vec<(usize, u32)>,
}

impl SearchResult {
    /// Get the visit count for a specific action
    pub fn visit_count_for_action(&self, action: usize) -> u32 {
        self.root_visit_counts
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    /// Get the total number of visits below the root
    pub fn total_visits(&self) -> u32 {
        self.root_visit_counts.iter().map(|(_, v)| v).sum()
    }
}

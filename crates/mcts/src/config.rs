use serde::{Deserialize, Serialize};

/// How the value of a child that has never been visited is seeded when its
/// parent is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstPlayUrgency {
    /// Unvisited children start with a total value of zero
    Zero,
    /// Unvisited children start with the evaluator's value for the parent
    ParentValue,
    /// Unvisited children start with the parent's running Q, so they compare
    /// equal to the parent's current average
    Equal,
}

/// Configuration for UCT search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Number of select/evaluate/backup iterations per search
    pub num_iterations: u32,

    /// Exploration constant weighting U against Q
    pub c_uct: f32,

    /// Whether to add Dirichlet noise to root priors (for self-play)
    pub add_dirichlet_noise: bool,

    /// Dirichlet concentration parameter
    pub dirichlet_alpha: f32,

    /// Dirichlet mixing weight (typically 0.25)
    pub dirichlet_epsilon: f32,

    /// Seeding of unvisited children's values
    pub first_play_urgency: FirstPlayUrgency,

    /// Evaluate each leaf under a random board symmetry
    pub symmetrize_evaluation: bool,
}

impl MctsConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of search iterations
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.num_iterations = n;
        self
    }

    /// Set exploration constant
    pub fn with_c_uct(mut self, c: f32) -> Self {
        self.c_uct = c;
        self
    }

    /// Enable Dirichlet noise with given parameters
    pub fn with_dirichlet_noise(mut self, alpha: f32, epsilon: f32) -> Self {
        self.add_dirichlet_noise = true;
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Disable Dirichlet noise
    pub fn without_dirichlet_noise(mut self) -> Self {
        self.add_dirichlet_noise = false;
        self
    }

    pub fn with_first_play_urgency(mut self, fpu: FirstPlayUrgency) -> Self {
        self.first_play_urgency = fpu;
        self
    }

    pub fn with_symmetrized_evaluation(mut self, enabled: bool) -> Self {
        self.symmetrize_evaluation = enabled;
        self
    }
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_iterations: 1000,
            c_uct: 1.0,
            add_dirichlet_noise: false,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.25,
            first_play_urgency: FirstPlayUrgency::Zero,
            symmetrize_evaluation: false,
        }
    }
}

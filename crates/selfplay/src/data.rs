use gridzero_core::{GameRules, GameState, Player};

/// Result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    PlayerZeroWin,
    PlayerOneWin,
    Draw,
}

impl GameResult {
    pub fn from_winner(winner: Option<Player>) -> Self {
        match winner {
            Some(Player::Zero) => GameResult::PlayerZeroWin,
            Some(Player::One) => GameResult::PlayerOneWin,
            None => GameResult::Draw,
        }
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::PlayerZeroWin => Some(Player::Zero),
            GameResult::PlayerOneWin => Some(Player::One),
            GameResult::Draw => None,
        }
    }

    /// Terminal reward for player zero
    pub fn reward(self) -> f32 {
        match self {
            GameResult::PlayerZeroWin => 1.0,
            GameResult::PlayerOneWin => -1.0,
            GameResult::Draw => 0.0,
        }
    }
}

/// Record of a single self-play game.
///
/// `states`, `distributions` and `outcomes` are parallel: every position is
/// stored once per board symmetry, and each variant is paired with the
/// matching transform of the target distribution.
#[derive(Debug, Clone)]
pub struct GameRecord {
    /// Symmetric variants of each visited position
    pub states: Vec<GameState>,
    /// Target distribution aligned with `states`
    pub distributions: Vec<Vec<f32>>,
    /// Final reward for the player to move in the aligned state
    pub outcomes: Vec<f32>,
    /// Actions actually played
    pub moves: Vec<usize>,
    /// Final result of the game
    pub result: GameResult,
}

impl GameRecord {
    /// Create a new empty game record
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            distributions: Vec::new(),
            outcomes: Vec::new(),
            moves: Vec::new(),
            result: GameResult::Draw,
        }
    }

    /// Number of recorded samples (positions times symmetries)
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if the record is empty
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of moves played
    pub fn num_moves(&self) -> usize {
        self.moves.len()
    }
}

impl Default for GameRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Samples from one or more games, concatenated
#[derive(Debug, Clone, Default)]
pub struct SelfPlayBatch {
    pub states: Vec<GameState>,
    pub distributions: Vec<Vec<f32>>,
    pub outcomes: Vec<f32>,
    pub num_games: usize,
}

impl SelfPlayBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_game(&mut self, record: GameRecord) {
        self.states.extend(record.states);
        self.distributions.extend(record.distributions);
        self.outcomes.extend(record.outcomes);
        self.num_games += 1;
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Encode every sample for the trainer, tagging each with `recency`
    pub fn to_training_examples(&self, game: &dyn GameRules, recency: u32) -> Vec<TrainingExample> {
        self.states
            .iter()
            .zip(&self.distributions)
            .zip(&self.outcomes)
            .map(|((state, policy), &value)| {
                TrainingExample::new(game.encode(state), policy.clone(), value, recency)
            })
            .collect()
    }
}

/// Training example for the network
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// Encoded position, `ENCODED_PLANES * rows * cols` values
    pub state: Vec<f32>,
    /// Target distribution over the action space
    pub policy: Vec<f32>,
    /// Target value (-1.0, 0.0, or 1.0)
    pub value: f32,
    /// Iteration tag used by the trainer to down-weight stale data
    pub recency: u32,
}

impl TrainingExample {
    /// Create a new training example
    pub fn new(state: Vec<f32>, policy: Vec<f32>, value: f32, recency: u32) -> Self {
        Self {
            state,
            policy,
            value,
            recency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridzero_core::ConnectK;

    #[test]
    fn test_game_result_rewards() {
        assert_eq!(GameResult::from_winner(Some(Player::One)), GameResult::PlayerOneWin);
        assert_eq!(GameResult::PlayerZeroWin.reward(), 1.0);
        assert_eq!(GameResult::PlayerOneWin.reward(), -1.0);
        assert_eq!(GameResult::Draw.winner(), None);
    }

    #[test]
    fn test_batch_concatenates_games() {
        let game = ConnectK::connect_four();
        let mut record = GameRecord::new();
        record.states.push(game.start_state());
        record.distributions.push(vec![1.0 / 7.0; 7]);
        record.outcomes.push(-1.0);
        record.moves.push(3);

        let mut batch = SelfPlayBatch::new();
        batch.push_game(record.clone());
        batch.push_game(record);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.num_games, 2);

        let examples = batch.to_training_examples(&game, 4);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].state.len(), 3 * 6 * 7);
        assert_eq!(examples[0].value, -1.0);
        assert_eq!(examples[1].recency, 4);
    }
}

use gridzero_core::{ActionMask, GameRules, GameState};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{thread_rng, Rng};

use crate::config::MctsConfig;
use crate::error::{MctsError, Result};
use crate::evaluation::{mask_and_normalize, softmax_legal, uniform_over_legal, Evaluator};
use crate::mcts::Mcts;

/// Distribution over the full action space plus a value for the player to
/// move.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyOutput {
    pub distribution: Vec<f32>,
    pub value: f32,
}

/// Something that can choose moves.
///
/// The returned distribution sums to 1 over exactly the legal actions.
pub trait Policy {
    fn action(&self, game: &dyn GameRules, state: &GameState) -> Result<PolicyOutput>;
}

impl<P: Policy + ?Sized> Policy for &P {
    fn action(&self, game: &dyn GameRules, state: &GameState) -> Result<PolicyOutput> {
        (**self).action(game, state)
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn action(&self, game: &dyn GameRules, state: &GameState) -> Result<PolicyOutput> {
        (**self).action(game, state)
    }
}

/// Uniform over legal actions
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPolicy;

impl Policy for UniformPolicy {
    fn action(&self, game: &dyn GameRules, state: &GameState) -> Result<PolicyOutput> {
        let mask = game.action_mask(state)?;
        Ok(PolicyOutput {
            distribution: uniform_over_legal(&mask),
            value: 0.0,
        })
    }
}

/// Evaluator priors used directly as a policy, without search
#[derive(Debug, Clone)]
pub struct EvaluatorPolicy<E> {
    pub evaluator: E,
}

impl<E: Evaluator> EvaluatorPolicy<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }
}

impl<E: Evaluator> Policy for EvaluatorPolicy<E> {
    fn action(&self, game: &dyn GameRules, state: &GameState) -> Result<PolicyOutput> {
        let mask = game.action_mask(state)?;
        let evaluation = self.evaluator.evaluate(game, state)?;
        Ok(PolicyOutput {
            distribution: mask_and_normalize(&evaluation.priors, &mask),
            value: evaluation.value,
        })
    }
}

/// Visit distribution of a fresh UCT search per call
#[derive(Debug, Clone)]
pub struct UctPolicy<E> {
    pub evaluator: E,
    pub config: MctsConfig,
}

impl<E: Evaluator> UctPolicy<E> {
    pub fn new(evaluator: E, config: MctsConfig) -> Self {
        Self { evaluator, config }
    }
}

impl<E: Evaluator> Policy for UctPolicy<E> {
    fn action(&self, game: &dyn GameRules, state: &GameState) -> Result<PolicyOutput> {
        let result = Mcts::new().search(game, state, &self.evaluator, &self.config)?;
        Ok(PolicyOutput {
            distribution: result.policy,
            value: result.value,
        })
    }
}

/// Monte-Carlo policy improvement over a base policy.
///
/// Every legal action is tried `num_simulations` times, the rest of each game
/// is played out with `base`, and the mean utility for the mover is turned
/// into a distribution with a softmax at `temperature`. A temperature of zero
/// puts all mass on the best action.
#[derive(Debug, Clone)]
pub struct RolloutPolicy<P> {
    pub base: P,
    pub temperature: f32,
    pub num_simulations: u32,
}

impl<P: Policy> RolloutPolicy<P> {
    pub fn new(base: P, temperature: f32, num_simulations: u32) -> Self {
        Self {
            base,
            temperature,
            num_simulations: num_simulations.max(1),
        }
    }

    fn playout<R: Rng>(
        &self,
        game: &dyn GameRules,
        state: &GameState,
        rng: &mut R,
    ) -> Result<GameState> {
        let mut current = state.clone();
        while !game.is_terminal(&current) {
            let output = self.base.action(game, &current)?;
            let action = sample_action(&output.distribution, rng)?;
            current = game.next_state(&current, action)?;
        }
        Ok(current)
    }
}

impl<P: Policy> Policy for RolloutPolicy<P> {
    fn action(&self, game: &dyn GameRules, state: &GameState) -> Result<PolicyOutput> {
        let mask = game.action_mask(state)?;
        let mover = state.player().index();
        let mut rng = thread_rng();

        let mut utilities = vec![f32::NEG_INFINITY; mask.len()];
        for action in mask.iter_legal() {
            let next = game.next_state(state, action)?;
            let mut total = 0.0;
            for _ in 0..self.num_simulations {
                let terminal = self.playout(game, &next, &mut rng)?;
                total += game.rewards(&terminal)[mover];
            }
            utilities[action] = total / self.num_simulations as f32;
        }

        let distribution = if self.temperature <= 0.0 {
            greedy(&utilities, &mask)?
        } else {
            let scaled: Vec<f32> = utilities.iter().map(|u| u / self.temperature).collect();
            softmax_legal(&scaled, &mask)
        };

        let value: f32 = mask
            .iter_legal()
            .map(|a| distribution[a] * utilities[a])
            .sum();

        Ok(PolicyOutput {
            distribution,
            value,
        })
    }
}

fn greedy(utilities: &[f32], mask: &ActionMask) -> Result<Vec<f32>> {
    let mut best: Option<(usize, f32)> = None;
    for a in mask.iter_legal() {
        match best {
            Some((_, u)) if utilities[a] <= u => {}
            _ => best = Some((a, utilities[a])),
        }
    }
    let (action, _) = best.ok_or(MctsError::NoLegalMoves)?;
    let mut out = vec![0.0; mask.len()];
    out[action] = 1.0;
    Ok(out)
}

fn sample_action<R: Rng>(distribution: &[f32], rng: &mut R) -> Result<usize> {
    let dist = WeightedIndex::new(distribution)
        .map_err(|e| MctsError::EvaluationFailed(format!("Invalid policy distribution: {e}")))?;
    Ok(dist.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{Evaluation, UniformEvaluator};
    use approx::assert_relative_eq;
    use gridzero_core::ConnectK;

    /// Position where player 0 (to move) wins immediately in column 3
    fn winning_position(game: &ConnectK) -> GameState {
        let mut state = game.start_state();
        for action in [0, 6, 1, 6, 2, 5] {
            state = game.next_state(&state, action).unwrap();
        }
        state
    }

    #[test]
    fn test_uniform_policy() {
        let game = ConnectK::connect_four();
        let output = UniformPolicy.action(&game, &game.start_state()).unwrap();
        assert_relative_eq!(output.distribution.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_eq!(output.value, 0.0);
    }

    #[test]
    fn test_evaluator_policy_masks_priors() {
        struct Peaked;
        impl Evaluator for Peaked {
            fn evaluate(&self, _game: &dyn GameRules, _state: &GameState) -> Result<Evaluation> {
                Ok(Evaluation {
                    priors: vec![0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
                    value: -0.3,
                })
            }
        }

        let game = ConnectK::connect_four();
        let mut state = game.start_state();
        for _ in 0..6 {
            state = game.next_state(&state, 0).unwrap();
        }
        let output = EvaluatorPolicy::new(Peaked).action(&game, &state).unwrap();
        assert_eq!(output.distribution[0], 0.0);
        assert_eq!(output.distribution[1], 1.0);
        assert_eq!(output.value, -0.3);
    }

    #[test]
    fn test_uct_policy_distribution_is_legal() {
        let game = ConnectK::connect_four();
        let policy = UctPolicy::new(UniformEvaluator, MctsConfig::default().with_iterations(50));
        let output = policy.action(&game, &game.start_state()).unwrap();
        assert_relative_eq!(output.distribution.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_eq!(output.distribution.len(), 7);
    }

    #[test]
    fn test_greedy_rollout_finds_immediate_win() {
        let game = ConnectK::connect_four();
        let state = winning_position(&game);
        let policy = RolloutPolicy::new(UniformPolicy, 0.0, 32);

        let output = policy.action(&game, &state).unwrap();
        assert_eq!(output.distribution[3], 1.0);
        assert_eq!(output.value, 1.0);
    }

    #[test]
    fn test_soft_rollout_prefers_win() {
        let game = ConnectK::connect_four();
        let state = winning_position(&game);
        let policy = RolloutPolicy::new(UniformPolicy, 0.1, 32);

        let output = policy.action(&game, &state).unwrap();
        assert_relative_eq!(output.distribution.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        let best = output
            .distribution
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |acc, (a, &p)| if p > acc.1 { (a, p) } else { acc });
        assert_eq!(best.0, 3);
    }
}

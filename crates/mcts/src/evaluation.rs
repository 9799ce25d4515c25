use gridzero_core::{ActionMask, GameRules, GameState};
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

use crate::error::{MctsError, Result};

/// Prior distribution and value estimate for a position
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Prior over the full action space
    pub priors: Vec<f32>,

    /// Value in [-1, 1] from the perspective of the player to move
    pub value: f32,
}

/// Leaf evaluation capability consumed by the search.
///
/// Implementations may be a trained network, a uniform policy, or a
/// Monte-Carlo rollout estimator.
pub trait Evaluator {
    fn evaluate(&self, game: &dyn GameRules, state: &GameState) -> Result<Evaluation>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, game: &dyn GameRules, state: &GameState) -> Result<Evaluation> {
        (**self).evaluate(game, state)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, game: &dyn GameRules, state: &GameState) -> Result<Evaluation> {
        (**self).evaluate(game, state)
    }
}

/// Uniform prior over legal actions and a value of zero.
///
/// Stands in for a network before the first model has been trained.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformEvaluator;

impl Evaluator for UniformEvaluator {
    fn evaluate(&self, game: &dyn GameRules, state: &GameState) -> Result<Evaluation> {
        let mask = game.action_mask(state)?;
        Ok(Evaluation {
            priors: uniform_over_legal(&mask),
            value: 0.0,
        })
    }
}

/// Uniform prior and a value averaged over random playouts
#[derive(Debug, Clone, Copy)]
pub struct RolloutEvaluator {
    pub num_rollouts: u32,
}

impl RolloutEvaluator {
    pub fn new(num_rollouts: u32) -> Self {
        Self {
            num_rollouts: num_rollouts.max(1),
        }
    }
}

impl Evaluator for RolloutEvaluator {
    fn evaluate(&self, game: &dyn GameRules, state: &GameState) -> Result<Evaluation> {
        let mask = game.action_mask(state)?;
        let mover = state.player().index();
        let mut rng = thread_rng();

        let mut total = 0.0;
        for _ in 0..self.num_rollouts {
            let terminal = random_playout(game, state, &mut rng)?;
            total += game.rewards(&terminal)[mover];
        }

        Ok(Evaluation {
            priors: uniform_over_legal(&mask),
            value: total / self.num_rollouts as f32,
        })
    }
}

/// Play uniformly random legal moves until the game ends
pub(crate) fn random_playout<R: Rng>(
    game: &dyn GameRules,
    state: &GameState,
    rng: &mut R,
) -> Result<GameState> {
    let mut current = state.clone();
    while !game.is_terminal(&current) {
        let legal: Vec<usize> = game.action_mask(&current)?.iter_legal().collect();
        let action = *legal.choose(rng).ok_or(MctsError::NoLegalMoves)?;
        current = game.next_state(&current, action)?;
    }
    Ok(current)
}

/// Uniform distribution over the legal actions of `mask`
pub fn uniform_over_legal(mask: &ActionMask) -> Vec<f32> {
    let count = mask.count();
    if count == 0 {
        return vec![0.0; mask.len()];
    }
    let p = 1.0 / count as f32;
    mask.as_slice()
        .iter()
        .map(|&legal| if legal { p } else { 0.0 })
        .collect()
}

/// Restrict `priors` to legal actions and renormalise.
///
/// Zero (or non-finite) mass on every legal action falls back to uniform over
/// the legal actions.
pub fn mask_and_normalize(priors: &[f32], mask: &ActionMask) -> Vec<f32> {
    let mut out: Vec<f32> = mask
        .as_slice()
        .iter()
        .enumerate()
        .map(|(a, &legal)| {
            let p = priors.get(a).copied().unwrap_or(0.0);
            if legal && p.is_finite() && p > 0.0 {
                p
            } else {
                0.0
            }
        })
        .collect();

    let sum: f32 = out.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return uniform_over_legal(mask);
    }
    out.iter_mut().for_each(|p| *p /= sum);
    out
}

/// Softmax over legal actions only; illegal actions get probability 0.
///
/// Used to turn network logits into priors.
pub fn softmax_legal(logits: &[f32], mask: &ActionMask) -> Vec<f32> {
    let max = mask
        .iter_legal()
        .map(|a| logits[a])
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return uniform_over_legal(mask);
    }

    let mut out = vec![0.0f32; mask.len()];
    let mut exp_sum = 0.0;
    for a in mask.iter_legal() {
        let e = (logits[a] - max).exp();
        out[a] = e;
        exp_sum += e;
    }
    out.iter_mut().for_each(|p| *p /= exp_sum);
    out
}

/// Evaluate a leaf, optionally under a random board symmetry.
///
/// With symmetrisation the evaluator sees a transformed position and its
/// priors are mapped back with the inverse symmetry, so the returned priors
/// always refer to `state`'s own action indices.
pub(crate) fn evaluate_leaf<E: Evaluator + ?Sized>(
    game: &dyn GameRules,
    state: &GameState,
    evaluator: &E,
    symmetrize: bool,
) -> Result<Evaluation> {
    let count = game.symmetry_count();
    if !symmetrize || count <= 1 {
        return checked(game, evaluator.evaluate(game, state)?);
    }

    let symmetry = thread_rng().gen_range(0..count);
    let transformed = game.transform_state(state, symmetry)?;
    let evaluation = checked(game, evaluator.evaluate(game, &transformed)?)?;
    let inverse = game.inverse_symmetry(symmetry)?;

    Ok(Evaluation {
        priors: game.transform_distribution(&evaluation.priors, inverse)?,
        value: evaluation.value,
    })
}

fn checked(game: &dyn GameRules, evaluation: Evaluation) -> Result<Evaluation> {
    if evaluation.priors.len() != game.action_size() {
        return Err(MctsError::EvaluationFailed(format!(
            "Expected priors of length {}, got {}",
            game.action_size(),
            evaluation.priors.len()
        )));
    }
    if !evaluation.value.is_finite() {
        return Err(MctsError::EvaluationFailed(format!(
            "Non-finite value estimate {}",
            evaluation.value
        )));
    }
    Ok(evaluation)
}

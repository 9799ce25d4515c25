use anyhow::{Context, Result};
use gridzero_core::{GameRules, Player};
use gridzero_mcts::Policy;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{thread_rng, Rng};

use crate::config::SelfPlayConfig;
use crate::data::{GameRecord, GameResult, SelfPlayBatch};

/// Play a single self-play game
///
/// # Arguments
/// * `game` - Rules of the game being played
/// * `policies` - Policy for player zero and player one
/// * `config` - Temperature shaping and sampling settings
///
/// # Returns
/// A complete game record with every symmetric variant of each position,
/// the aligned target distributions and the signed final outcome
pub fn play_game(
    game: &dyn GameRules,
    policies: [&dyn Policy; 2],
    config: &SelfPlayConfig,
) -> Result<GameRecord> {
    let mut rng = thread_rng();
    let symmetries = game.all_symmetries();
    let mut state = game.start_state();
    let mut record = GameRecord::new();
    let mut movers: Vec<Player> = Vec::new();

    while !game.is_terminal(&state) {
        let variants = game.apply_symmetries(&state, &symmetries)?;
        movers.extend(std::iter::repeat(state.player()).take(variants.len()));
        record.states.extend(variants);

        let output = policies[state.player().index()]
            .action(game, &state)
            .with_context(|| format!("Policy failed at move {}", record.num_moves()))?;

        let shaped = if record.num_moves() >= config.temperature_threshold {
            sharpen(&output.distribution, config.sharpen_exponent)
        } else {
            output.distribution.clone()
        };

        record
            .distributions
            .extend(game.apply_symmetries_to_distribution(&shaped, &symmetries)?);

        let sampled_from = if config.sample_shaped {
            &shaped
        } else {
            &output.distribution
        };
        let action = sample_action(sampled_from, &mut rng)?;

        state = game.next_state(&state, action)?;
        record.moves.push(action);
    }

    record.result = GameResult::from_winner(state.winner());
    let reward = game.rewards(&state)[Player::Zero.index()];
    record.outcomes = movers.iter().map(|p| outcome_label(reward, *p)).collect();

    log::debug!(
        "Game finished after {} moves: {:?}",
        record.num_moves(),
        record.result
    );

    Ok(record)
}

/// Play `num_games` games and concatenate their samples
pub fn run_iteration(
    game: &dyn GameRules,
    policies: [&dyn Policy; 2],
    num_games: usize,
    config: &SelfPlayConfig,
) -> Result<SelfPlayBatch> {
    let mut batch = SelfPlayBatch::new();

    for i in 0..num_games {
        let record = play_game(game, policies, config)?;
        batch.push_game(record);
        log::info!(
            "Game {}/{}: {} states generated",
            i + 1,
            num_games,
            batch.len()
        );
    }

    Ok(batch)
}

/// Raise every probability to `exponent` and renormalise.
///
/// Falls back to the input when the result underflows to zero.
pub fn sharpen(distribution: &[f32], exponent: i32) -> Vec<f32> {
    let powered: Vec<f32> = distribution.iter().map(|p| p.powi(exponent)).collect();
    let sum: f32 = powered.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return distribution.to_vec();
    }
    powered.into_iter().map(|p| p / sum).collect()
}

/// Outcome label for a position where `mover` was to play, given player
/// zero's final reward
fn outcome_label(reward: f32, mover: Player) -> f32 {
    match mover {
        Player::Zero => reward,
        Player::One => -reward,
    }
}

fn sample_action<R: Rng>(distribution: &[f32], rng: &mut R) -> Result<usize> {
    let dist = WeightedIndex::new(distribution).context("Policy returned an invalid distribution")?;
    Ok(dist.sample(rng))
}

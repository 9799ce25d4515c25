use anyhow::Result;
use gridzero_core::{GameRules, GameState, Player};
use gridzero_mcts::Policy;
use rand::distributions::{Distribution, WeightedIndex};
use rand::thread_rng;

/// Something that picks a single move
pub trait Agent {
    fn select_action(&self, game: &dyn GameRules, state: &GameState) -> Result<usize>;
}

/// Agent that plays from a policy's distribution at a temperature
///
/// - temperature = 0: argmax (deterministic)
/// - temperature = 1: proportional to the distribution
/// - otherwise: proportional to p^(1/t)
pub struct PolicyAgent<P> {
    pub policy: P,
    pub temperature: f32,
}

impl<P: Policy> PolicyAgent<P> {
    pub fn new(policy: P, temperature: f32) -> Self {
        Self {
            policy,
            temperature,
        }
    }
}

impl<P: Policy> Agent for PolicyAgent<P> {
    fn select_action(&self, game: &dyn GameRules, state: &GameState) -> Result<usize> {
        let output = self.policy.action(game, state)?;
        select_with_temperature(&output.distribution, self.temperature)
    }
}

fn select_with_temperature(distribution: &[f32], temperature: f32) -> Result<usize> {
    if temperature < 0.01 {
        return argmax(distribution);
    }

    let inv_temp = 1.0f64 / temperature as f64;
    let weights: Vec<f64> = distribution
        .iter()
        .map(|&p| {
            let w = p as f64;
            if w <= 0.0 {
                0.0
            } else {
                w.powf(inv_temp)
            }
        })
        .collect();

    match WeightedIndex::new(&weights) {
        Ok(dist) => Ok(dist.sample(&mut thread_rng())),
        // All weights underflowed: fall back to argmax
        Err(_) => argmax(distribution),
    }
}

/// First index of the largest probability
fn argmax(distribution: &[f32]) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (a, &p) in distribution.iter().enumerate() {
        match best {
            Some((_, q)) if p <= q => {}
            _ => best = Some((a, p)),
        }
    }
    best.map(|(a, _)| a)
        .ok_or_else(|| anyhow::anyhow!("Empty distribution"))
}

/// Play one game between two agents, returning the winner
pub fn play_match(game: &dyn GameRules, agents: [&dyn Agent; 2]) -> Result<Option<Player>> {
    let mut state = game.start_state();
    while !game.is_terminal(&state) {
        let action = agents[state.player().index()].select_action(game, &state)?;
        state = game.next_state(&state, action)?;
    }
    Ok(state.winner())
}

/// Tally of a head-to-head series, from the first agent's point of view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl MatchStats {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Score with draws counted as half a win
    pub fn score(&self) -> f32 {
        if self.games() == 0 {
            return 0.0;
        }
        (self.wins as f32 + 0.5 * self.draws as f32) / self.games() as f32
    }
}

/// Play `num_games` between `a` and `b`, alternating who moves first
pub fn evaluate_agents(
    game: &dyn GameRules,
    a: &dyn Agent,
    b: &dyn Agent,
    num_games: u32,
) -> Result<MatchStats> {
    let mut stats = MatchStats::default();

    for i in 0..num_games {
        let a_seat = if i % 2 == 0 { Player::Zero } else { Player::One };
        let agents = match a_seat {
            Player::Zero => [a, b],
            Player::One => [b, a],
        };

        match play_match(game, agents)? {
            Some(winner) if winner == a_seat => stats.wins += 1,
            Some(_) => stats.losses += 1,
            None => stats.draws += 1,
        }
    }

    log::info!(
        "Match finished: {} wins, {} losses, {} draws (score {:.3})",
        stats.wins,
        stats.losses,
        stats.draws,
        stats.score()
    );

    Ok(stats)
}

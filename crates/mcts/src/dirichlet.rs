use gridzero_core::ActionMask;
use rand::thread_rng;
use rand_distr::{Dirichlet, Distribution};

use crate::error::{MctsError, Result};

/// Mix Dirichlet noise into root priors for exploration
///
/// This is used during self-play to encourage exploration.
/// The noise is drawn over the legal actions only and mixed with the prior:
/// P' = (1-ε)*P + ε*noise
///
/// A single legal action is left untouched.
pub fn mix_dirichlet_noise(
    priors: &mut [f32],
    mask: &ActionMask,
    alpha: f32,
    epsilon: f32,
) -> Result<()> {
    let legal: Vec<usize> = mask.iter_legal().collect();
    if legal.len() < 2 {
        return Ok(());
    }

    let alpha_vec = vec![alpha as f64; legal.len()];
    let dirichlet =
        Dirichlet::new(&alpha_vec).map_err(|e| MctsError::DirichletError(e.to_string()))?;

    let noise = dirichlet.sample(&mut thread_rng());

    for (&action, &n) in legal.iter().zip(noise.iter()) {
        priors[action] = (1.0 - epsilon) * priors[action] + epsilon * n as f32;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dirichlet_noise_changes_priors() {
        let mask = ActionMask::new(vec![true, true, true, false]);
        let original = vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0];
        let mut priors = original.clone();

        mix_dirichlet_noise(&mut priors, &mask, 0.3, 0.25).unwrap();

        assert!(
            original
                .iter()
                .zip(priors.iter())
                .any(|(o, n)| (o - n).abs() > 1e-6),
            "Priors should change after adding noise"
        );

        // Still a distribution, and still zero off the legal support
        let sum: f32 = priors.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-4);
        assert_eq!(priors[3], 0.0);
    }

    #[test]
    fn test_single_legal_action_untouched() {
        let mask = ActionMask::new(vec![false, true, false]);
        let mut priors = vec![0.0, 1.0, 0.0];

        mix_dirichlet_noise(&mut priors, &mask, 0.3, 0.25).unwrap();
        assert_eq!(priors, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_invalid_alpha_is_an_error() {
        let mask = ActionMask::new(vec![true, true]);
        let mut priors = vec![0.5, 0.5];
        let result = mix_dirichlet_noise(&mut priors, &mask, -1.0, 0.25);
        assert!(matches!(result, Err(MctsError::DirichletError(_))));
    }

    #[test]
    fn test_small_epsilon_keeps_ordering() {
        let mask = ActionMask::new(vec![true, true, true]);
        let mut priors = vec![0.8, 0.15, 0.05];

        mix_dirichlet_noise(&mut priors, &mask, 0.3, 0.1).unwrap();

        // With epsilon 0.1 the leading prior keeps at least 0.72
        assert!(priors[0] > priors[1] && priors[0] > priors[2]);
    }
}

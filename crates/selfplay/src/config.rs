use serde::{Deserialize, Serialize};

/// Move selection settings for a self-play game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Moves played before the recorded distribution is sharpened
    pub temperature_threshold: usize,

    /// Exponent applied to the distribution once past the threshold
    pub sharpen_exponent: i32,

    /// Sample the played move from the sharpened distribution instead of
    /// the raw policy output
    pub sample_shaped: bool,
}

impl SelfPlayConfig {
    pub fn with_temperature_threshold(mut self, moves: usize) -> Self {
        self.temperature_threshold = moves;
        self
    }

    pub fn with_sharpen_exponent(mut self, exponent: i32) -> Self {
        self.sharpen_exponent = exponent;
        self
    }

    pub fn with_sample_shaped(mut self, enabled: bool) -> Self {
        self.sample_shaped = enabled;
        self
    }
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            temperature_threshold: 5,
            sharpen_exponent: 10,
            sample_shaped: false,
        }
    }
}

//! Difficulty ramp: obstacle speed and spawn cadence as pure functions of
//! score.

use crate::config::GameConfig;

/// Per-tick parameters derived from the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    pub speed: f64,
    pub cadence: u32,
}

impl Difficulty {
    pub fn for_score(config: &GameConfig, score: u32) -> Self {
        Self {
            speed: speed(config, score),
            cadence: cadence(config, score),
        }
    }
}

/// Speed goes up by `speed_step` every 5 points, capped at
/// `base_speed + speed_increase_cap`.
pub fn speed(config: &GameConfig, score: u32) -> f64 {
    let ramp = (score / 5) as f64 * config.speed_step;
    config.base_speed + ramp.min(config.speed_increase_cap)
}

/// One frame fewer between spawns every 2 points, never below the floor.
pub fn cadence(config: &GameConfig, score: u32) -> u32 {
    config
        .base_cadence
        .saturating_sub(score / 2)
        .max(config.cadence_floor)
}

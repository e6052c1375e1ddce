use std::{env, time::Duration};

use crate::error::ConfigError;

// ── Gameplay constants ──────────────────────────────────────────────────────

/// World geometry and tuning for one game. All lengths are world units, all
/// rates are per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub world_width: f64,
    pub world_height: f64,
    pub ground_height: f64,
    /// Side of the bird's square sprite.
    pub bird_size: f64,
    /// Fixed left edge of the bird sprite.
    pub bird_x: f64,
    /// Margin trimmed from every side of the sprite to get the hitbox.
    pub hitbox_inset: f64,
    pub obstacle_width: f64,
    pub gap_size: u32,
    /// Smallest gap-top height an obstacle may be spawned with.
    pub min_gap_top: u32,
    pub gravity: f64,
    /// Velocity written by a jump (negative is up).
    pub jump_velocity: f64,
    pub base_speed: f64,
    /// Extra speed per 5 points of score.
    pub speed_step: f64,
    pub speed_increase_cap: f64,
    /// Frames between spawns at score 0.
    pub base_cadence: u32,
    pub cadence_floor: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: 400.0,
            world_height: 600.0,
            ground_height: 50.0,
            bird_size: 30.0,
            bird_x: 50.0,
            hitbox_inset: 6.0,
            obstacle_width: 50.0,
            gap_size: 160,
            min_gap_top: 50,
            gravity: 0.6,
            jump_velocity: -8.0,
            base_speed: 3.0,
            speed_step: 0.2,
            speed_increase_cap: 3.0,
            base_cadence: 100,
            cadence_floor: 60,
        }
    }
}

impl GameConfig {
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_gap_size(mut self, gap_size: u32) -> Self {
        self.gap_size = gap_size;
        self
    }

    pub fn with_cadence(mut self, base: u32, floor: u32) -> Self {
        self.base_cadence = base;
        self.cadence_floor = floor;
        self
    }

    /// Top of the ground strip; the playable sky is `0..sky_height()`.
    pub fn sky_height(&self) -> f64 {
        self.world_height - self.ground_height
    }

    /// Largest gap-top height that still leaves `min_gap_top` of pipe above
    /// the ground.
    pub fn max_gap_top(&self) -> u32 {
        let max = self.sky_height() - self.gap_size as f64 - self.min_gap_top as f64;
        max.max(0.0) as u32
    }

    /// Bird's resting position at the start of every run.
    pub fn start_y(&self) -> f64 {
        self.world_height / 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_cadence == 0 || self.cadence_floor == 0 {
            return Err(ConfigError::NonPositiveCadence);
        }
        if self.cadence_floor > self.base_cadence {
            return Err(ConfigError::CadenceFloorAboveBase {
                floor: self.cadence_floor,
                base: self.base_cadence,
            });
        }
        if !(self.gravity > 0.0) {
            return Err(ConfigError::NonPositiveGravity(self.gravity));
        }
        if !(self.jump_velocity < 0.0) {
            return Err(ConfigError::JumpNotUpward(self.jump_velocity));
        }
        if !(self.base_speed > 0.0) || self.speed_step < 0.0 || self.speed_increase_cap < 0.0 {
            return Err(ConfigError::InvalidSpeed);
        }
        if 2.0 * self.hitbox_inset >= self.bird_size {
            return Err(ConfigError::HitboxTooSmall);
        }
        let needed = self.gap_size as f64 + 2.0 * self.min_gap_top as f64;
        if needed > self.sky_height() {
            return Err(ConfigError::GapDoesNotFit {
                needed,
                available: self.sky_height(),
            });
        }
        Ok(())
    }
}

// ── Commentary service ──────────────────────────────────────────────────────

pub const DEFAULT_COMMENTARY_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_COMMENTARY_MODEL: &str = "gemini-2.5-flash";

/// Settings for the remote text-generation service, read from the
/// environment.
#[derive(Debug, Clone)]
pub struct CommentaryConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub language: String,
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_COMMENTARY_ENDPOINT.to_string(),
            model: DEFAULT_COMMENTARY_MODEL.to_string(),
            timeout: Duration::from_millis(8000),
            language: "English".to_string(),
        }
    }
}

impl CommentaryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let timeout = env::var("COMMENTARY_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);

        Self {
            api_key,
            endpoint: env::var("COMMENTARY_ENDPOINT").unwrap_or(defaults.endpoint),
            model: env::var("COMMENTARY_MODEL").unwrap_or(defaults.model),
            timeout,
            language: env::var("COMMENTARY_LANGUAGE").unwrap_or(defaults.language),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn max_gap_top_leaves_room_above_ground() {
        let config = GameConfig::default();
        // 600 - 50 - 160 - 50
        assert_eq!(config.max_gap_top(), 340);
        assert!(config.max_gap_top() as f64 + config.gap_size as f64 <= config.sky_height());
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let config = GameConfig::default().with_cadence(0, 0);
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveCadence));
    }

    #[test]
    fn floor_above_base_is_rejected() {
        let config = GameConfig::default().with_cadence(40, 60);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CadenceFloorAboveBase { floor: 60, base: 40 })
        ));
    }

    #[test]
    fn oversized_gap_is_rejected() {
        let config = GameConfig::default().with_gap_size(500);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GapDoesNotFit { .. })
        ));
    }

    #[test]
    fn non_positive_gravity_is_rejected() {
        let config = GameConfig::default().with_gravity(0.0);
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveGravity(0.0)));
    }
}

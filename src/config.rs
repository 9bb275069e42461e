use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ACTOR_HIT_SIZE, ACTOR_SPEED, BONUS_LIFE_THRESHOLD, INVINCIBILITY_SECS, PELLET_VALUE,
    PICKUP_HIT_SIZE, POWER_PELLET_VALUE, STARTING_LIVES, TICK_RATE, TILE_SIZE,
};
use crate::error::ConfigError;
use crate::types::PickupKind;

/// Tunables for one match. Missing JSON fields fall back to the defaults in `constants`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub tick_rate: u32,
    pub tile_size: f32,
    /// World units per second.
    pub actor_speed: f32,
    pub actor_hit_size: f32,
    pub pickup_hit_size: f32,
    pub starting_lives: u32,
    pub invincibility_secs: f32,
    pub bonus_life_threshold: u64,
    pub pellet_value: u64,
    pub power_pellet_value: u64,
    pub time_limit_secs: Option<f32>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            tile_size: TILE_SIZE,
            actor_speed: ACTOR_SPEED,
            actor_hit_size: ACTOR_HIT_SIZE,
            pickup_hit_size: PICKUP_HIT_SIZE,
            starting_lives: STARTING_LIVES,
            invincibility_secs: INVINCIBILITY_SECS,
            bonus_life_threshold: BONUS_LIFE_THRESHOLD,
            pellet_value: PELLET_VALUE,
            power_pellet_value: POWER_PELLET_VALUE,
            time_limit_secs: None,
        }
    }
}

impl MatchConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(invalid("tickRate", "must be at least 1"));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(invalid("tileSize", "must be a positive number"));
        }
        if !(self.actor_speed.is_finite() && self.actor_speed > 0.0) {
            return Err(invalid("actorSpeed", "must be a positive number"));
        }
        if !(self.actor_hit_size.is_finite() && self.actor_hit_size > 0.0) {
            return Err(invalid("actorHitSize", "must be a positive number"));
        }
        if !(self.pickup_hit_size > 0.0 && self.pickup_hit_size <= self.tile_size) {
            return Err(invalid(
                "pickupHitSize",
                "must be positive and no larger than a tile",
            ));
        }
        if self.starting_lives == 0 {
            return Err(invalid("startingLives", "must be at least 1"));
        }
        if !(self.invincibility_secs.is_finite() && self.invincibility_secs >= 0.0) {
            return Err(invalid("invincibilitySecs", "must be zero or positive"));
        }
        if let Some(limit) = self.time_limit_secs {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(invalid("timeLimitSecs", "must be a positive number"));
            }
        }
        Ok(())
    }

    pub fn tick_secs(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn pickup_value(&self, kind: PickupKind) -> u64 {
        match kind {
            PickupKind::Pellet => self.pellet_value,
            PickupKind::PowerPellet => self.power_pellet_value,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

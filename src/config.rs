//! World configuration
//!
//! Loaded from JSON; every field is optional and falls back to its default.
//! Physical units (metres, seconds) are converted to pixels and ticks once,
//! when a `World` is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunables for a `World`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Speed cap in metres/second
    pub terminal_velocity: f64,
    /// Gravity in metres/second²
    pub gravity_accel: f64,
    /// Anything whose top crosses below this line (pixels, down is positive) is destroyed
    pub maximum_y: i64,
    pub pixels_per_meter: i64,
    /// Simulation step length
    pub ms_per_tick: u64,
    /// Redraw cadence for the driver loop
    pub ms_per_frame: u64,
    /// RNG seed
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            terminal_velocity: 53.0,
            gravity_accel: 10.0,
            maximum_y: 100_000,
            pixels_per_meter: 1000,
            ms_per_tick: 30,
            ms_per_frame: 16,
            seed: 0,
        }
    }
}

impl WorldConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixels_per_meter <= 0 {
            return Err(invalid("pixels_per_meter", "must be positive"));
        }
        if self.ms_per_tick == 0 {
            return Err(invalid("ms_per_tick", "must be positive"));
        }
        if self.ms_per_frame == 0 {
            return Err(invalid("ms_per_frame", "must be positive"));
        }
        if !self.terminal_velocity.is_finite() || self.terminal_velocity < 0.0 {
            return Err(invalid(
                "terminal_velocity",
                format!("must be finite and non-negative, got {}", self.terminal_velocity),
            ));
        }
        if !self.gravity_accel.is_finite() {
            return Err(invalid("gravity_accel", "must be finite"));
        }
        Ok(())
    }

    /// Gravity in pixels/tick², rounded to the nearest pixel
    pub fn gravity_per_tick(&self) -> i64 {
        let ms = self.ms_per_tick as f64;
        (self.gravity_accel * self.pixels_per_meter as f64 * ms * ms / 1e6).round() as i64
    }

    /// Speed cap in pixels/tick, rounded to the nearest pixel
    pub fn max_velocity_per_tick(&self) -> i64 {
        (self.terminal_velocity * self.pixels_per_meter as f64 * self.ms_per_tick as f64 / 1e3)
            .round() as i64
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_conversions() {
        let config = WorldConfig::default();
        assert_eq!(config.gravity_per_tick(), 9);
        assert_eq!(config.max_velocity_per_tick(), 1590);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorldConfig::from_json(r#"{ "gravity_accel": 3, "maximum_y": 5000 }"#).unwrap();
        assert_eq!(config.maximum_y, 5000);
        assert_eq!(config.ms_per_tick, 30);
        assert_eq!(config.gravity_per_tick(), 3);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = WorldConfig {
            seed: 42,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(WorldConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = WorldConfig::from_json(r#"{ "ms_per_tick": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::Invalid { field: "ms_per_tick", .. }));
        let err = WorldConfig::from_json(r#"{ "pixels_per_meter": -5 }"#).unwrap_err();
        assert!(matches!(err, Error::Invalid { field: "pixels_per_meter", .. }));
        assert!(matches!(
            WorldConfig::from_json("not json").unwrap_err(),
            Error::Parse(_)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = WorldConfig::load("/nonexistent/world.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/world.json"));
    }
}

//! # Engine Configuration
//!
//! Settings for the runtime core: logging, frame pacing, entity id
//! generation, the fixed-timestep clock and the event queue. Every field has
//! a default so partial config files are valid.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::ids::DEFAULT_ENTITY_PREFIX;

/// Default fixed update rate
pub const DEFAULT_FIXED_FPS: f64 = 60.0;

/// Default cap on fixed steps run by a single frame
pub const DEFAULT_MAX_FIXED_STEPS: u32 = 10;

/// Default cap on `process_events` drain passes
pub const DEFAULT_MAX_DISPATCH_PASSES: usize = 64;

/// # Engine Configuration
///
/// Top-level configuration applications hand to [`crate::Engine::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Target frame rate for [`crate::Engine::run`]; `None` runs unpaced
    pub target_fps: Option<u32>,
    /// Entity id generation
    pub entities: EntityConfig,
    /// Frame clock settings
    pub clock: ClockConfig,
    /// Event bus settings
    pub events: EventConfig,
}

/// Entity id generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    /// Prefix for generated ids
    pub id_prefix: String,
    /// Seed for the random suffix; `None` seeds from OS entropy
    pub id_seed: Option<u64>,
}

/// Fixed-timestep clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed callbacks run at this rate, i.e. every `1000 / fixed_fps` ms
    pub fixed_fps: f64,
    /// Upper bound on fixed steps per frame; `None` means unbounded catch-up
    pub max_fixed_steps_per_tick: Option<u32>,
}

/// Event bus settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// How many drain passes `process_events` may make before giving up
    pub max_dispatch_passes: usize,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            target_fps: Some(60),
            entities: EntityConfig::default(),
            clock: ClockConfig::default(),
            events: EventConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set target FPS, or `None` for an unpaced loop
    pub fn with_target_fps(mut self, fps: Option<u32>) -> Self {
        self.target_fps = fps;
        self
    }

    /// Set the fixed update rate
    pub fn with_fixed_fps(mut self, fps: f64) -> Self {
        self.clock.fixed_fps = fps;
        self
    }

    /// Make generated entity ids reproducible
    pub fn with_id_seed(mut self, seed: u64) -> Self {
        self.entities.id_seed = Some(seed);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.clock.fixed_fps.is_finite() && self.clock.fixed_fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "clock.fixed_fps must be a positive number, got {}",
                self.clock.fixed_fps
            )));
        }
        if self.clock.max_fixed_steps_per_tick == Some(0) {
            return Err(ConfigError::Invalid(
                "clock.max_fixed_steps_per_tick must be at least 1".to_string(),
            ));
        }
        if self.events.max_dispatch_passes == 0 {
            return Err(ConfigError::Invalid(
                "events.max_dispatch_passes must be at least 1".to_string(),
            ));
        }
        if self.target_fps == Some(0) {
            return Err(ConfigError::Invalid("target_fps must be at least 1".to_string()));
        }
        if self.entities.id_prefix.is_empty() {
            return Err(ConfigError::Invalid("entities.id_prefix cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ENTITY_PREFIX.to_string(),
            id_seed: None,
        }
    }
}

impl ClockConfig {
    /// Length of one fixed step in milliseconds
    pub fn fixed_time_step(&self) -> f64 {
        1000.0 / self.fixed_fps
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fixed_fps: DEFAULT_FIXED_FPS,
            max_fixed_steps_per_tick: Some(DEFAULT_MAX_FIXED_STEPS),
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            max_dispatch_passes: DEFAULT_MAX_DISPATCH_PASSES,
        }
    }
}

impl Config for EngineConfig {
    fn check(&self) -> Result<(), ConfigError> {
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.clock.fixed_time_step(), 1000.0 / 60.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = EngineConfig::default().with_fixed_fps(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.events.max_dispatch_passes = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.clock.max_fixed_steps_per_tick = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            log_level = "debug"

            [clock]
            fixed_fps = 30.0
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.clock.fixed_fps, 30.0);
        assert_eq!(config.clock.max_fixed_steps_per_tick, Some(DEFAULT_MAX_FIXED_STEPS));
        assert_eq!(config.entities.id_prefix, DEFAULT_ENTITY_PREFIX);
        assert_eq!(config.events.max_dispatch_passes, DEFAULT_MAX_DISPATCH_PASSES);
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");

        let config = EngineConfig::default().with_id_seed(42).with_log_level("warn");
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_loading_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[clock]\nfixed_fps = -1.0\n").unwrap();

        let result = EngineConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "log_level: info").unwrap();

        let result = EngineConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}

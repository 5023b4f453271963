//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use strata_stream::StreamSettings;

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "terrain.ron";

/// Top-level terrain session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// World seed, layers, mesh resolution, LOD table, scatter categories.
    pub streaming: StreamSettings,
    /// Scripted observer motion for headless runs.
    pub observer: ObserverConfig,
    pub debug: DebugConfig,
}

/// Straight-line observer path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObserverConfig {
    /// Ground-plane start position.
    pub start: Vec2,
    /// Ground-plane displacement per tick.
    pub velocity: Vec2,
    pub ticks: u32,
    /// Sleep between ticks, giving workers time to finish.
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log streaming statistics every this many ticks; 0 disables.
    pub stats_interval: u32,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            start: Vec2::ZERO,
            velocity: Vec2::new(12.0, 5.0),
            ticks: 240,
            tick_interval_ms: 16,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 60,
        }
    }
}

/// Platform config directory for strata, or `./.strata` when there is none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("strata"))
        .unwrap_or_else(|| PathBuf::from(".strata"))
}

impl TerrainConfig {
    /// Clamp every value into its supported range.
    pub fn validate(&mut self) {
        self.streaming.validate();
        if !self.observer.start.is_finite() {
            self.observer.start = Vec2::ZERO;
        }
        if !self.observer.velocity.is_finite() {
            self.observer.velocity = Vec2::ZERO;
        }
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let parsed: TerrainConfig = ron::from_str(contents).map_err(ConfigError::ParseError)?;
        let validated = parsed.clone().validated();
        if validated != parsed {
            log::warn!("Clamped out-of-range terrain config values");
        }
        Ok(validated)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config = Self::parse(&contents)?;
            log::info!("Loaded terrain config from {}", config_path.display());
            Ok(config)
        } else {
            let config = TerrainConfig::default();
            config.save(config_dir)?;
            log::info!("Created default terrain config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `terrain.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(5)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Returns `Some(new_config)` if the file on disk differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config = Self::parse(&contents)?;

        if &new_config != self {
            log::info!("Terrain config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = TerrainConfig::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(5))
                .unwrap();
        assert!(ron_str.contains("viewer_move_threshold: 25.0"));
        assert!(ron_str.contains("collider_generation_distance: 10.0"));
        assert!(ron_str.contains("\"forest\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = TerrainConfig::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: TerrainConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let config: TerrainConfig = ron::from_str("(debug: (log_level: \"debug\"))").unwrap();
        assert_eq!(config.streaming, StreamSettings::default());
        assert_eq!(config.debug.log_level, "debug");
        assert_eq!(config.debug.stats_interval, 60);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<TerrainConfig, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_out_of_range_values_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "(streaming: (collider_lod_index: 9, mesh: (mesh_scale: -1.0)))",
        )
        .unwrap();

        let config = TerrainConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config.streaming.collider_lod_index, 2);
        assert_eq!(config.streaming.mesh.mesh_scale, 0.01);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, TerrainConfig::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TerrainConfig::default();
        config.streaming.world_seed = 99;
        config.streaming.water_level = 7.5;
        config.observer.ticks = 10;

        config.save(dir.path()).unwrap();
        let loaded = TerrainConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.streaming.world_seed = 1234;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().streaming.world_seed, 1234);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = TerrainConfig::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        let result = TerrainConfig::load_or_create(dir.path());
        match result {
            Err(err @ ConfigError::ParseError(_)) => {
                assert!(err.to_string().contains(CONFIG_FILE_NAME), "message names the file: {err}");
            }
            other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
        }
    }
}

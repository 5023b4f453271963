//! Terrain session configuration.
//!
//! A single RON document, `terrain.ron`, describes the streaming settings,
//! the observer path driven by the demo, and debug options. Missing fields
//! fall back to defaults, and out-of-range values are clamped on load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE_NAME, DebugConfig, ObserverConfig, TerrainConfig, default_config_dir};
pub use error::ConfigError;

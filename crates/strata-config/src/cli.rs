//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use strata_lod::{LodInfo, LodTable};

use crate::TerrainConfig;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `terrain.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Procedural terrain streaming")]
pub struct CliArgs {
    /// World seed for object scattering.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Multiplier applied to every LOD distance.
    #[arg(long)]
    pub lod_distance_scale: Option<f32>,

    /// Number of ticks to run.
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the origin chunk's height fields as PNG images into this directory.
    #[arg(long)]
    pub dump_heightmap: Option<PathBuf>,
}

impl TerrainConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.streaming.world_seed = seed;
        }
        if let Some(scale) = args.lod_distance_scale {
            let levels = self
                .streaming
                .lod_table
                .levels()
                .iter()
                .map(|info| LodInfo::new(info.lod, info.visible_distance * scale))
                .collect();
            self.streaming.lod_table = LodTable::new(levels);
        }
        if let Some(ticks) = args.ticks {
            self.observer.ticks = ticks;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = TerrainConfig::default();
        let args = CliArgs {
            seed: Some(77),
            lod_distance_scale: Some(0.5),
            log_level: Some("debug,strata_stream=trace".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.streaming.world_seed, 77);
        assert_eq!(config.streaming.lod_table.max_view_distance(), 300.0);
        assert_eq!(config.streaming.lod_table.levels()[0].visible_distance, 100.0);
        assert_eq!(config.debug.log_level, "debug,strata_stream=trace");
        // Non-overridden fields retain defaults
        assert_eq!(config.observer.ticks, 240);
    }

    #[test]
    fn test_cli_no_override() {
        let original = TerrainConfig::default();
        let mut config = TerrainConfig::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["strata", "--seed", "5", "--ticks", "3", "--dump-heightmap", "out"]);
        assert_eq!(args.seed, Some(5));
        assert_eq!(args.ticks, Some(3));
        assert_eq!(args.dump_heightmap, Some(PathBuf::from("out")));
    }
}

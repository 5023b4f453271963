//! Multi-octave coherent noise over a square sample window.
//!
//! Octave offsets come from a ChaCha stream seeded by the config, so the same
//! config, window size and sample centre always yield bit-identical grids.

use glam::{DVec2, Vec2};
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Range of the random per-octave offsets. Large enough that neighbouring
/// seeds never sample overlapping regions of the noise lattice.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Fraction of the theoretical maximum used as the global normalisation
/// ceiling. Real sums rarely approach the geometric bound.
const GLOBAL_NORMALIZE_HEADROOM: f64 = 0.85;

/// Floor applied to globally normalised samples.
pub const GLOBAL_NORMALIZE_FLOOR: f32 = 0.05;

/// How a finished noise grid is remapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    /// Stretch the observed min/max of this grid onto `[0, 1]`.
    #[default]
    Local,
    /// Divide by the theoretical maximum so adjacent chunks line up.
    Global,
}

/// Parameters of one fractal noise field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Seed of the octave-offset stream and the gradient table.
    pub seed: u64,
    /// Number of octaves accumulated per sample.
    pub octaves: u32,
    /// Amplitude multiplier between octaves, in `[0, 1]`.
    pub persistence: f32,
    /// Frequency multiplier between octaves, at least 1.
    pub lacunarity: f32,
    /// Size of the broadest features in samples.
    pub scale: f32,
    /// Global offset added to every octave.
    pub offset: Vec2,
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 6,
            persistence: 0.4,
            lacunarity: 2.0,
            scale: 50.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Local,
        }
    }
}

impl NoiseConfig {
    /// Clamp every parameter into its supported range.
    pub fn validate(&mut self) {
        self.scale = if self.scale.is_finite() {
            self.scale.max(0.01)
        } else {
            0.01
        };
        self.octaves = self.octaves.max(1);
        self.lacunarity = if self.lacunarity.is_finite() {
            self.lacunarity.max(1.0)
        } else {
            1.0
        };
        self.persistence = if self.persistence.is_finite() {
            self.persistence.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Consuming variant of [`validate`](Self::validate).
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// Sum of all octave amplitudes, the upper bound of a raw sample.
    pub fn max_possible_height(&self) -> f64 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..self.octaves {
            sum += amplitude;
            amplitude *= self.persistence as f64;
        }
        sum
    }
}

/// A seeded fractal noise evaluator anchored at one sample centre.
pub struct NoiseField {
    perlin: Perlin,
    octave_offsets: Vec<DVec2>,
    config: NoiseConfig,
    max_possible_height: f64,
}

impl NoiseField {
    /// Build the evaluator. The config is validated on a private copy.
    pub fn new(config: &NoiseConfig, sample_center: Vec2) -> Self {
        let config = config.clone().validated();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let octave_offsets = (0..config.octaves)
            .map(|_| {
                let ox = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64
                    + config.offset.x as f64
                    + sample_center.x as f64;
                let oy = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f64
                    - config.offset.y as f64
                    - sample_center.y as f64;
                DVec2::new(ox, oy)
            })
            .collect();

        Self {
            perlin: Perlin::new(config.seed as u32),
            octave_offsets,
            max_possible_height: config.max_possible_height(),
            config,
        }
    }

    /// Raw octave sum at a window-local coordinate (already centred).
    ///
    /// Each octave contributes Perlin noise remapped to `[0, 1]`, so the
    /// result lies in `[0, max_possible_height]`.
    pub fn sample_raw(&self, local: DVec2) -> f64 {
        let scale = self.config.scale as f64;
        let persistence = self.config.persistence as f64;
        let lacunarity = self.config.lacunarity as f64;

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;

        for offset in &self.octave_offsets {
            let sx = (local.x + offset.x) / scale * frequency;
            let sy = (local.y + offset.y) / scale * frequency;
            let value = (self.perlin.get([sx, sy]) * 0.5 + 0.5).clamp(0.0, 1.0);
            total += value * amplitude;

            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total
    }

    /// Fill a `size x size` grid, stored row-major (`y * size + x`).
    pub fn evaluate(&self, size: usize) -> Vec<f32> {
        let mut grid = vec![0.0_f32; size * size];
        let half = size as f64 / 2.0;
        let global_divisor = self.max_possible_height / GLOBAL_NORMALIZE_HEADROOM;

        let mut min = f64::MAX;
        let mut max = f64::MIN;

        for y in 0..size {
            for x in 0..size {
                let raw = self.sample_raw(DVec2::new(x as f64 - half, y as f64 - half));
                min = min.min(raw);
                max = max.max(raw);

                grid[y * size + x] = match self.config.normalize_mode {
                    NormalizeMode::Local => raw as f32,
                    NormalizeMode::Global => {
                        (((raw + 1.0) / global_divisor) as f32).max(GLOBAL_NORMALIZE_FLOOR)
                    }
                };
            }
        }

        if self.config.normalize_mode == NormalizeMode::Local {
            let range = max - min;
            for value in &mut grid {
                *value = if range > 0.0 {
                    ((*value as f64 - min) / range) as f32
                } else {
                    0.0
                };
            }
        }

        grid
    }

    /// The validated config this field was built from.
    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }
}

/// Evaluate `config` over a `size x size` window centred on `sample_center`.
pub fn generate_noise_map(size: usize, config: &NoiseConfig, sample_center: Vec2) -> Vec<f32> {
    NoiseField::new(config, sample_center).evaluate(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min_max(grid: &[f32]) -> (f32, f32) {
        grid.iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    #[test]
    fn test_same_arguments_produce_identical_grids() {
        let config = NoiseConfig {
            seed: 42,
            ..Default::default()
        };
        let a = generate_noise_map(33, &config, Vec2::new(120.0, -40.0));
        let b = generate_noise_map(33, &config, Vec2::new(120.0, -40.0));
        assert_eq!(a, b, "identical arguments must give bit-identical output");
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_noise_map(17, &NoiseConfig { seed: 1, ..Default::default() }, Vec2::ZERO);
        let b = generate_noise_map(17, &NoiseConfig { seed: 2, ..Default::default() }, Vec2::ZERO);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sample_center_shifts_the_window() {
        let config = NoiseConfig::default();
        let a = generate_noise_map(17, &config, Vec2::ZERO);
        let b = generate_noise_map(17, &config, Vec2::new(64.0, 0.0));
        assert_ne!(a, b, "moving the sample centre must move the window");
    }

    #[test]
    fn test_local_normalization_spans_unit_range() {
        let config = NoiseConfig {
            seed: 7,
            scale: 8.0,
            ..Default::default()
        };
        let grid = generate_noise_map(49, &config, Vec2::ZERO);
        let (lo, hi) = min_max(&grid);
        assert!(lo.abs() < 1e-5, "local min should be 0, got {lo}");
        assert!((hi - 1.0).abs() < 1e-5, "local max should be 1, got {hi}");
    }

    #[test]
    fn test_global_normalization_respects_floor() {
        for seed in 0..5 {
            let config = NoiseConfig {
                seed,
                scale: 5.0,
                normalize_mode: NormalizeMode::Global,
                ..Default::default()
            };
            let grid = generate_noise_map(41, &config, Vec2::new(seed as f32 * 10.0, 3.0));
            let (lo, _) = min_max(&grid);
            assert!(lo >= GLOBAL_NORMALIZE_FLOOR, "global sample {lo} below floor");
        }
    }

    #[test]
    fn test_validate_clamps_out_of_range_values() {
        let config = NoiseConfig {
            scale: -3.0,
            octaves: 0,
            lacunarity: 0.2,
            persistence: 1.7,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.scale, 0.01);
        assert_eq!(config.octaves, 1);
        assert_eq!(config.lacunarity, 1.0);
        assert_eq!(config.persistence, 1.0);
    }

    #[test]
    fn test_max_possible_height_is_geometric_sum() {
        let config = NoiseConfig {
            octaves: 4,
            persistence: 0.5,
            ..Default::default()
        };
        assert!((config.max_possible_height() - 1.875).abs() < 1e-12);
    }

    #[test]
    fn test_raw_samples_stay_within_theoretical_bound() {
        let config = NoiseConfig {
            seed: 3,
            ..Default::default()
        };
        let field = NoiseField::new(&config, Vec2::ZERO);
        let bound = config.max_possible_height();
        for i in 0..200 {
            let raw = field.sample_raw(DVec2::new(i as f64 * 1.7, i as f64 * -0.3));
            assert!((0.0..=bound).contains(&raw), "raw sample {raw} outside [0, {bound}]");
        }
    }
}

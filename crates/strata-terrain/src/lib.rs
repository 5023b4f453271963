//! Procedural terrain fields: fractal noise, height layers, and height-driven scattering.

mod curve;
mod heightmap;
mod noise_field;
mod poisson;
mod seed;

pub mod texture;

pub use curve::{Keyframe, ResponseCurve};
pub use heightmap::{
    HeightField, HeightLayer, LayerEntry, combine, composite, composite_layer, enabled_layers,
};
pub use noise_field::{GLOBAL_NORMALIZE_FLOOR, NoiseConfig, NoiseField, NormalizeMode, generate_noise_map};
pub use poisson::{PoissonDiscSampler, PoissonSampleSpec, generate_points};
pub use seed::{chunk_rng, derive_chunk_seed};

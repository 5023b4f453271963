//! Height layers, height fields, and the compositor that builds one from the other.
//!
//! A [`HeightLayer`] is a noise config shaped by a response curve and scaled by
//! an amplitude. The compositor evaluates enabled layers over a square window
//! and sums them into a [`HeightField`] that records its own min/max.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::curve::ResponseCurve;
use crate::noise_field::{NoiseConfig, NoiseField};

/// One named noise layer contributing to chunk elevation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightLayer {
    /// Key under which a chunk stores this layer's field.
    pub id: String,
    pub noise: NoiseConfig,
    /// Maps the normalised noise sample before amplitude scaling.
    pub curve: ResponseCurve,
    pub amplitude: f32,
    /// Whether this layer shapes the terrain mesh and collider.
    pub use_for_terrain: bool,
}

impl Default for HeightLayer {
    fn default() -> Self {
        Self {
            id: "height".to_string(),
            noise: NoiseConfig::default(),
            curve: ResponseCurve::identity(),
            amplitude: 1.0,
            use_for_terrain: true,
        }
    }
}

impl HeightLayer {
    /// Clamp the noise parameters and replace a non-finite amplitude with 0.
    pub fn validate(&mut self) {
        self.noise.validate();
        if !self.amplitude.is_finite() {
            self.amplitude = 0.0;
        }
    }

    /// Lowest value this layer can produce (curve at 0 times amplitude).
    pub fn min_height(&self) -> f32 {
        self.amplitude * self.curve.evaluate(0.0)
    }

    /// Highest value this layer can produce (curve at 1 times amplitude).
    pub fn max_height(&self) -> f32 {
        self.amplitude * self.curve.evaluate(1.0)
    }
}

/// A layer plus its on/off switch, as listed in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerEntry {
    pub enabled: bool,
    pub layer: HeightLayer,
}

impl Default for LayerEntry {
    fn default() -> Self {
        Self {
            enabled: true,
            layer: HeightLayer::default(),
        }
    }
}

/// Iterate the layers of `entries` that are switched on.
pub fn enabled_layers(entries: &[LayerEntry]) -> impl Iterator<Item = &HeightLayer> {
    entries.iter().filter(|e| e.enabled).map(|e| &e.layer)
}

/// A square grid of elevation samples, stored row-major (`y * size + x`).
///
/// Immutable once built; `min`/`max` always describe `values`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    size: usize,
    values: Vec<f32>,
    min: f32,
    max: f32,
    sources: Vec<HeightLayer>,
}

impl HeightField {
    /// An all-zero field with `min == max == 0`.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
            min: 0.0,
            max: 0.0,
            sources: Vec::new(),
        }
    }

    /// Wrap raw samples, scanning once for min/max.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != size * size`.
    pub fn from_values(size: usize, values: Vec<f32>, sources: Vec<HeightLayer>) -> Self {
        assert_eq!(values.len(), size * size, "height field must be size x size");
        if values.is_empty() {
            return Self {
                sources,
                ..Self::zeros(size)
            };
        }
        let (min, max) = values
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Self {
            size,
            values,
            min,
            max,
            sources,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sample at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.size && y < self.size, "({x}, {y}) outside {0}x{0}", self.size);
        self.values[y * self.size + x]
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Layers that produced this field.
    pub fn sources(&self) -> &[HeightLayer] {
        &self.sources
    }

    /// Id of the first source layer, if any.
    pub fn layer_id(&self) -> Option<&str> {
        self.sources.first().map(|l| l.id.as_str())
    }

    /// True when any source layer is flagged for terrain.
    pub fn contributes_to_terrain(&self) -> bool {
        self.sources.iter().any(|l| l.use_for_terrain)
    }
}

/// Evaluate one layer over a `size x size` window.
pub fn composite_layer(size: usize, layer: &HeightLayer, sample_center: Vec2) -> HeightField {
    let mut layer = layer.clone();
    layer.validate();

    let mut values = NoiseField::new(&layer.noise, sample_center).evaluate(size);
    // Each call owns its clone of the keyframe table.
    let curve = layer.curve.clone();
    for v in &mut values {
        *v = curve.evaluate(*v) * layer.amplitude;
    }
    HeightField::from_values(size, values, vec![layer])
}

/// Sum every enabled layer of `entries` into one field.
///
/// No enabled layers yields [`HeightField::zeros`].
pub fn composite(size: usize, entries: &[LayerEntry], sample_center: Vec2) -> HeightField {
    let fields: Vec<HeightField> = enabled_layers(entries)
        .map(|layer| composite_layer(size, layer, sample_center))
        .collect();
    combine(size, fields.iter())
}

/// Element-wise sum of `fields`, each of which must be `size x size`.
pub fn combine<'a>(size: usize, fields: impl IntoIterator<Item = &'a HeightField>) -> HeightField {
    let mut total = vec![0.0_f32; size * size];
    let mut sources = Vec::new();
    let mut any = false;

    for field in fields {
        assert_eq!(field.size, size, "cannot combine fields of different sizes");
        for (acc, v) in total.iter_mut().zip(&field.values) {
            *acc += *v;
        }
        sources.extend(field.sources.iter().cloned());
        any = true;
    }

    if !any {
        return HeightField::zeros(size);
    }
    HeightField::from_values(size, total, sources)
}

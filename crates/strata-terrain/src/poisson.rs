//! Poisson disc sampling with height-driven spacing.
//!
//! Dart throwing around active points, accelerated by a uniform grid whose
//! cells hold every accepted point that could reach them. The minimum spacing
//! at a location is read from a height field through a radius curve, so dense
//! and sparse regions follow the terrain.

use std::f32::consts::{SQRT_2, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::curve::ResponseCurve;
use crate::heightmap::HeightField;

/// Parameters of one scatter pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoissonSampleSpec {
    /// Smallest allowed spacing. Also fixes the grid cell size.
    pub radius_min: f32,
    /// Points whose curve radius exceeds this are culled after sampling.
    pub radius_max: f32,
    /// Maps a height-field value to a desired spacing.
    pub radius_curve: ResponseCurve,
    /// Candidates tried around an active point before it is retired.
    pub rejection_samples: u32,
    /// Fraction of grid cells that may receive a point, halved internally.
    pub fullness: f32,
}

impl Default for PoissonSampleSpec {
    fn default() -> Self {
        Self {
            radius_min: 2.0,
            radius_max: 8.0,
            radius_curve: ResponseCurve::linear(&[(0.0, 8.0), (1.0, 2.0)]),
            rejection_samples: 30,
            fullness: 1.0,
        }
    }
}

impl PoissonSampleSpec {
    /// Clamp radii, the rejection budget, and fullness into range.
    pub fn validate(&mut self) {
        self.radius_min = if self.radius_min.is_finite() {
            self.radius_min.max(0.01)
        } else {
            0.01
        };
        self.radius_max = if self.radius_max.is_finite() {
            self.radius_max.max(self.radius_min)
        } else {
            self.radius_min
        };
        self.rejection_samples = self.rejection_samples.max(1);
        self.fullness = if self.fullness.is_finite() {
            self.fullness.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// Grid cell edge length for this spec.
    pub fn cell_size(&self) -> f32 {
        self.radius_min / SQRT_2
    }

    /// Upper bound on the number of points sampled over `region_size`.
    pub fn max_point_count(&self, region_size: Vec2) -> usize {
        let (cols, rows) = grid_dims(self.cell_size(), region_size);
        ((rows * cols) as f32 * self.fullness.clamp(0.0, 1.0) / 2.0).floor() as usize
    }
}

fn grid_dims(cell_size: f32, region_size: Vec2) -> (usize, usize) {
    let cols = (region_size.x / cell_size).ceil().max(0.0) as usize;
    let rows = (region_size.y / cell_size).ceil().max(0.0) as usize;
    (cols, rows)
}

/// Maps region coordinates onto height-field indices.
struct FieldLookup<'a> {
    field: &'a HeightField,
    scale: Vec2,
    region_size: Vec2,
}

impl<'a> FieldLookup<'a> {
    fn new(field: &'a HeightField, region_size: Vec2) -> Self {
        let size = field.size() as f32;
        Self {
            field,
            scale: Vec2::new(size / region_size.x, size / region_size.y),
            region_size,
        }
    }

    /// Height value under `point`. The field must cover the whole region.
    fn value_at(&self, point: Vec2) -> f32 {
        debug_assert!(
            point.x >= 0.0
                && point.y >= 0.0
                && point.x <= self.region_size.x
                && point.y <= self.region_size.y,
            "sample {point} outside region {}",
            self.region_size
        );
        let last = self.field.size() - 1;
        let x = ((point.x * self.scale.x).floor().max(0.0) as usize).min(last);
        let y = ((point.y * self.scale.y).floor().max(0.0) as usize).min(last);
        self.field.get(x, y)
    }
}

/// Working state of one sampling pass.
pub struct PoissonDiscSampler<'a> {
    spec: PoissonSampleSpec,
    region_size: Vec2,
    lookup: FieldLookup<'a>,
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Per cell, indices of accepted points whose radius reaches the cell.
    grid: Vec<Vec<u32>>,
    points: Vec<Vec2>,
}

impl<'a> PoissonDiscSampler<'a> {
    pub fn new(spec: &PoissonSampleSpec, region_size: Vec2, field: &'a HeightField) -> Self {
        let spec = spec.clone().validated();
        let cell_size = spec.cell_size();
        let (cols, rows) = grid_dims(cell_size, region_size);
        Self {
            lookup: FieldLookup::new(field, region_size),
            region_size,
            cell_size,
            cols,
            rows,
            grid: vec![Vec::new(); cols * rows],
            points: Vec::new(),
            spec,
        }
    }

    /// Run the sampler to completion and return the culled point set.
    pub fn run(mut self, rng: &mut impl Rng) -> Vec<Vec2> {
        if self.cols == 0 || self.rows == 0 || self.lookup.field.size() == 0 {
            return Vec::new();
        }

        let max_points = self.spec.max_point_count(self.region_size);
        let mut active = vec![Vec2::new(
            rng.random_range(0.0..self.region_size.x),
            rng.random_range(0.0..self.region_size.y),
        )];

        while !active.is_empty() && self.points.len() < max_points {
            let spawn_index = rng.random_range(0..active.len());
            let spawn_center = active[spawn_index];
            let radius = self.radius_at(spawn_center);

            let mut accepted = false;
            for _ in 0..self.spec.rejection_samples {
                let angle = rng.random_range(0.0..TAU);
                let distance = rng.random_range(radius..2.0 * radius);
                let candidate = spawn_center + Vec2::from_angle(angle) * distance;

                if !self.in_bounds(candidate) {
                    continue;
                }
                let candidate_radius = self.radius_at(candidate);
                if self.is_clear(candidate, candidate_radius) {
                    self.accept(candidate, candidate_radius);
                    active.push(candidate);
                    accepted = true;
                    break;
                }
            }

            if !accepted {
                active.swap_remove(spawn_index);
            }
        }

        self.cull()
    }

    /// Spacing required at `point`: the curve value, floored at `radius_min`
    /// and capped at the region diagonal.
    fn radius_at(&self, point: Vec2) -> f32 {
        let value = self.lookup.value_at(point);
        self.spec
            .radius_curve
            .evaluate(value)
            .max(self.spec.radius_min)
            .min(self.region_size.length())
    }

    fn in_bounds(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.region_size.x && p.y < self.region_size.y
    }

    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let cx = ((p.x / self.cell_size).floor().max(0.0) as usize).min(self.cols - 1);
        let cy = ((p.y / self.cell_size).floor().max(0.0) as usize).min(self.rows - 1);
        (cx, cy)
    }

    /// Inclusive cell ranges within `radius` rings of `p`'s cell.
    fn cell_span(&self, p: Vec2, radius: f32) -> (usize, usize, usize, usize) {
        let (cx, cy) = self.cell_of(p);
        let rings = ((radius / self.cell_size).ceil() as usize).min(self.cols.max(self.rows));
        (
            cx.saturating_sub(rings),
            (cx + rings).min(self.cols - 1),
            cy.saturating_sub(rings),
            (cy + rings).min(self.rows - 1),
        )
    }

    /// No accepted point lies closer than `radius` to `candidate`.
    fn is_clear(&self, candidate: Vec2, radius: f32) -> bool {
        let radius_sq = radius * radius;
        let (x0, x1, y0, y1) = self.cell_span(candidate, radius);
        for y in y0..=y1 {
            for x in x0..=x1 {
                for &index in &self.grid[y * self.cols + x] {
                    if candidate.distance_squared(self.points[index as usize]) < radius_sq {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn accept(&mut self, point: Vec2, radius: f32) {
        let index = self.points.len() as u32;
        self.points.push(point);

        let (x0, x1, y0, y1) = self.cell_span(point, radius);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.grid[y * self.cols + x].push(index);
            }
        }
    }

    /// Drop points the radius curve marks as too sparse for this category.
    fn cull(self) -> Vec<Vec2> {
        let lookup = &self.lookup;
        let curve = &self.spec.radius_curve;
        let radius_max = self.spec.radius_max;
        self.points
            .into_iter()
            .filter(|&p| curve.evaluate(lookup.value_at(p)) <= radius_max)
            .collect()
    }
}

/// Sample `region_size` with spacing driven by `field`, seeded by `seed`.
///
/// `field` must cover the whole region: index `(0, 0)` maps to the region
/// origin and the last index to its far corner.
pub fn generate_points(
    spec: &PoissonSampleSpec,
    region_size: Vec2,
    field: &HeightField,
    seed: u64,
) -> Vec<Vec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    PoissonDiscSampler::new(spec, region_size, field).run(&mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_field(size: usize) -> HeightField {
        let values = (0..size * size)
            .map(|i| (i % size) as f32 / (size - 1) as f32)
            .collect();
        HeightField::from_values(size, values, Vec::new())
    }

    fn constant_field(size: usize, value: f32) -> HeightField {
        HeightField::from_values(size, vec![value; size * size], Vec::new())
    }

    fn local_radius(spec: &PoissonSampleSpec, field: &HeightField, region: Vec2, p: Vec2) -> f32 {
        let lookup = FieldLookup::new(field, region);
        spec.radius_curve.evaluate(lookup.value_at(p)).max(spec.radius_min)
    }

    #[test]
    fn test_points_within_region() {
        let spec = PoissonSampleSpec::default();
        let region = Vec2::new(60.0, 40.0);
        let field = gradient_field(32);
        let points = generate_points(&spec, region, &field, 1);
        assert!(!points.is_empty());
        for p in &points {
            assert!(
                p.x >= 0.0 && p.y >= 0.0 && p.x <= region.x && p.y <= region.y,
                "point {p} outside region {region}"
            );
        }
    }

    #[test]
    fn test_spacing_respects_local_radii() {
        let spec = PoissonSampleSpec {
            radius_min: 1.5,
            radius_max: 10.0,
            radius_curve: ResponseCurve::linear(&[(0.0, 1.5), (1.0, 6.0)]),
            rejection_samples: 30,
            fullness: 1.0,
        };
        let region = Vec2::splat(50.0);
        let field = gradient_field(41);

        for seed in 0..4 {
            let points = generate_points(&spec, region, &field, seed);
            for (i, &a) in points.iter().enumerate() {
                let ra = local_radius(&spec, &field, region, a);
                for &b in &points[i + 1..] {
                    let rb = local_radius(&spec, &field, region, b);
                    let required = ra.min(rb);
                    assert!(
                        a.distance(b) >= required - 1e-4,
                        "points {a} and {b} closer than {required}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_output_never_exceeds_fullness_bound() {
        let region = Vec2::new(30.0, 30.0);
        let field = constant_field(16, 0.0);
        for fullness in [0.05, 0.3, 1.0, 4.0] {
            let spec = PoissonSampleSpec {
                radius_min: 1.0,
                radius_max: 1.0,
                radius_curve: ResponseCurve::constant(1.0),
                rejection_samples: 30,
                fullness,
            };
            let cell = 1.0 / SQRT_2;
            let cols = (region.x / cell).ceil() as usize;
            let rows = (region.y / cell).ceil() as usize;
            let bound = ((rows * cols) as f32 * fullness.min(1.0) / 2.0).floor() as usize;
            let points = generate_points(&spec, region, &field, 9);
            assert!(points.len() <= bound, "{} points exceed bound {bound}", points.len());
            assert_eq!(spec.clone().validated().max_point_count(region), bound);
        }
    }

    #[test]
    fn test_zero_fullness_yields_nothing() {
        let spec = PoissonSampleSpec {
            fullness: 0.0,
            ..Default::default()
        };
        let points = generate_points(&spec, Vec2::splat(20.0), &gradient_field(8), 3);
        assert!(points.is_empty());
    }

    #[test]
    fn test_sparse_regions_are_culled() {
        let spec = PoissonSampleSpec {
            radius_min: 1.0,
            radius_max: 4.0,
            radius_curve: ResponseCurve::constant(5.0),
            rejection_samples: 20,
            fullness: 1.0,
        };
        let points = generate_points(&spec, Vec2::splat(40.0), &constant_field(8, 0.5), 5);
        assert!(points.is_empty(), "every point exceeds radius_max and must be culled");
    }

    #[test]
    fn test_cull_keeps_only_dense_side() {
        // Radius grows along x; only the low-x half stays under radius_max.
        let spec = PoissonSampleSpec {
            radius_min: 1.0,
            radius_max: 3.0,
            radius_curve: ResponseCurve::linear(&[(0.0, 1.0), (1.0, 5.0)]),
            rejection_samples: 30,
            fullness: 1.0,
        };
        let region = Vec2::splat(40.0);
        let field = gradient_field(40);
        let points = generate_points(&spec, region, &field, 11);
        assert!(!points.is_empty());
        for p in &points {
            assert!(p.x < 21.0, "point {p} should have been culled");
        }
    }

    #[test]
    fn test_huge_curve_radius_is_capped() {
        // Left half maps to radius 1, right half to an absurd spacing.
        let size = 16;
        let values = (0..size * size)
            .map(|i| if i % size < size / 2 { 0.0 } else { 1.0 })
            .collect();
        let field = HeightField::from_values(size, values, Vec::new());
        let spec = PoissonSampleSpec {
            radius_min: 1.0,
            radius_max: 2.0,
            radius_curve: ResponseCurve::linear(&[(0.0, 1.0), (0.5, 1.0), (1.0, 1e20)]),
            rejection_samples: 30,
            fullness: 1.0,
        };
        let region = Vec2::splat(40.0);

        let mut total = 0;
        for seed in 0..16 {
            let points = generate_points(&spec, region, &field, seed);
            for p in &points {
                assert!(p.x >= 0.0 && p.y >= 0.0 && p.x <= region.x && p.y <= region.y);
                assert!(p.x < 20.0, "point {p} on the sparse side should be culled");
            }
            total += points.len();
        }
        assert!(total > 0, "dense half never received points");
    }

    #[test]
    fn test_same_seed_same_points() {
        let spec = PoissonSampleSpec::default();
        let field = gradient_field(16);
        let a = generate_points(&spec, Vec2::splat(32.0), &field, 77);
        let b = generate_points(&spec, Vec2::splat(32.0), &field, 77);
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate_clamps_spec() {
        let spec = PoissonSampleSpec {
            radius_min: -1.0,
            radius_max: -5.0,
            rejection_samples: 0,
            fullness: 3.0,
            ..Default::default()
        }
        .validated();
        assert_eq!(spec.radius_min, 0.01);
        assert_eq!(spec.radius_max, 0.01);
        assert_eq!(spec.rejection_samples, 1);
        assert_eq!(spec.fullness, 1.0);
    }
}

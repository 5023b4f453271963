//! Headless stand-in for an object-instantiation system.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use strata_stream::{ChunkCoord, ObjectPlacer, ScatterPoints};
use strata_terrain::HeightField;
use tracing::debug;

/// Resolves scatter points to world positions and tallies them by category.
#[derive(Debug, Default)]
pub struct TallyPlacer {
    totals: BTreeMap<String, usize>,
    chunks: usize,
}

impl TallyPlacer {
    pub fn totals(&self) -> &BTreeMap<String, usize> {
        &self.totals
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }
}

/// World position of a region-space point, with its height read from
/// `heights` (nearest sample).
pub fn world_position(point: Vec2, chunk_center: Vec2, heights: &HeightField, region_size: f32) -> Vec3 {
    let size = heights.size();
    let ground = chunk_center + point - Vec2::splat(region_size / 2.0);
    if size == 0 || region_size <= 0.0 {
        return Vec3::new(ground.x, 0.0, ground.y);
    }
    let last = size - 1;
    let scale = size as f32 / region_size;
    let x = ((point.x * scale).floor().max(0.0) as usize).min(last);
    let y = ((point.y * scale).floor().max(0.0) as usize).min(last);
    Vec3::new(ground.x, heights.get(x, y), ground.y)
}

impl ObjectPlacer for TallyPlacer {
    fn place(
        &mut self,
        coord: ChunkCoord,
        points: &ScatterPoints,
        chunk_center: Vec2,
        combined: &HeightField,
        region_size: f32,
    ) {
        self.chunks += 1;
        for (category, list) in points {
            *self.totals.entry(category.clone()).or_default() += list.len();
            if let Some(first) = list.first() {
                let position = world_position(*first, chunk_center, combined, region_size);
                debug!(%coord, %category, count = list.len(), first = %position, "objects placed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_position_offsets_from_chunk_centre() {
        let values = (0..16).map(|i| i as f32).collect();
        let heights = HeightField::from_values(4, values, Vec::new());
        let p = world_position(Vec2::new(0.0, 0.0), Vec2::new(100.0, 50.0), &heights, 40.0);
        assert_eq!(p, Vec3::new(80.0, 0.0, 30.0));
        let p = world_position(Vec2::new(39.0, 39.0), Vec2::ZERO, &heights, 40.0);
        assert_eq!(p, Vec3::new(19.0, 15.0, 19.0));
    }

    #[test]
    fn test_tally_by_category() {
        let mut placer = TallyPlacer::default();
        let mut points = ScatterPoints::new();
        points.insert("trees".to_string(), vec![Vec2::ONE; 3]);
        points.insert("rocks".to_string(), Vec::new());
        let heights = HeightField::zeros(4);
        placer.place(ChunkCoord::ORIGIN, &points, Vec2::ZERO, &heights, 40.0);
        placer.place(ChunkCoord::new(1, 0), &points, Vec2::ZERO, &heights, 40.0);
        assert_eq!(placer.totals()["trees"], 6);
        assert_eq!(placer.totals()["rocks"], 0);
        assert_eq!(placer.chunks(), 2);
    }
}

//! Chunk lattice coordinates and ground-plane bounds.

use glam::Vec2;

/// Integer position of a chunk on the terrain grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The chunk whose centre is nearest to a ground-plane `position`.
    pub fn from_world(position: Vec2, chunk_world_size: f32) -> Self {
        Self {
            x: (position.x / chunk_world_size).round() as i32,
            y: (position.y / chunk_world_size).round() as i32,
        }
    }

    /// Chunk centre in world units.
    pub fn world_center(self, chunk_world_size: f32) -> Vec2 {
        self.as_vec2() * chunk_world_size
    }

    /// Centre of this chunk in noise sample space, where one unit is one
    /// height-field sample.
    pub fn sample_center(self, chunk_world_size: f32, mesh_scale: f32) -> Vec2 {
        self.as_vec2() * chunk_world_size / mesh_scale
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn as_tuple(self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Bounds2 {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_extents: size * 0.5,
        }
    }

    /// The square footprint of chunk `coord`.
    pub fn for_chunk(coord: ChunkCoord, chunk_world_size: f32) -> Self {
        Self::new(coord.world_center(chunk_world_size), Vec2::splat(chunk_world_size))
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Squared distance from `point` to the nearest point of the rectangle;
    /// zero inside.
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let nearest = point.clamp(self.min(), self.max());
        point.distance_squared(nearest)
    }

    pub fn distance(&self, point: Vec2) -> f32 {
        self.sqr_distance(point).sqrt()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.sqr_distance(point) == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_rounds_to_nearest_centre() {
        assert_eq!(ChunkCoord::from_world(Vec2::new(114.0, -116.0), 230.0), ChunkCoord::new(0, -1));
        assert_eq!(ChunkCoord::from_world(Vec2::new(460.0, 0.0), 230.0), ChunkCoord::new(2, 0));
    }

    #[test]
    fn test_centres() {
        let coord = ChunkCoord::new(2, -1);
        assert_eq!(coord.world_center(230.0), Vec2::new(460.0, -230.0));
        assert_eq!(coord.sample_center(230.0, 5.0), Vec2::new(92.0, -46.0));
    }

    #[test]
    fn test_coordinate_equality_is_componentwise() {
        assert_eq!(ChunkCoord::new(1, 2), ChunkCoord::from((1, 2)));
        assert_ne!(ChunkCoord::new(1, 2), ChunkCoord::new(2, 1));
    }

    #[test]
    fn test_bounds_distance() {
        let bounds = Bounds2::for_chunk(ChunkCoord::new(1, 0), 100.0);
        assert_eq!(bounds.min(), Vec2::new(50.0, -50.0));
        assert_eq!(bounds.sqr_distance(Vec2::new(100.0, 20.0)), 0.0);
        assert!(bounds.contains(Vec2::new(150.0, 50.0)));
        assert_eq!(bounds.distance(Vec2::new(0.0, 0.0)), 50.0);
        assert_eq!(bounds.sqr_distance(Vec2::new(153.0, 54.0)), 25.0);
    }
}

//! Distance-based LOD selection over an ordered threshold table.

use serde::{Deserialize, Serialize};

/// Number of mesh LOD levels the mesher supports.
pub const NUM_SUPPORTED_LODS: u8 = 5;

/// Highest (coarsest) mesh LOD level.
pub const MAX_MESH_LOD: u8 = NUM_SUPPORTED_LODS - 1;

/// One row of the LOD table: a mesh level and the furthest distance at which
/// it is still used.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodInfo {
    /// Mesh detail level, `0` is full resolution.
    pub lod: u8,
    /// Maximum observer-to-chunk distance for this row.
    pub visible_distance: f32,
}

impl LodInfo {
    pub fn new(lod: u8, visible_distance: f32) -> Self {
        Self {
            lod,
            visible_distance,
        }
    }

    pub fn sqr_visible_distance(&self) -> f32 {
        self.visible_distance * self.visible_distance
    }
}

/// Ordered LOD thresholds, nearest first.
///
/// Construction clamps rather than rejects: levels are capped at
/// [`MAX_MESH_LOD`], distances are made non-negative and non-decreasing, and
/// an empty table falls back to the default one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LodInfo>", into = "Vec<LodInfo>")]
pub struct LodTable {
    levels: Vec<LodInfo>,
}

impl LodTable {
    pub fn new(levels: Vec<LodInfo>) -> Self {
        if levels.is_empty() {
            return Self::default();
        }

        let mut floor = 0.0_f32;
        let levels = levels
            .into_iter()
            .map(|info| {
                let distance = if info.visible_distance.is_finite() {
                    info.visible_distance.max(floor)
                } else {
                    floor
                };
                floor = distance;
                LodInfo::new(info.lod.min(MAX_MESH_LOD), distance)
            })
            .collect();
        Self { levels }
    }

    /// Build from `(lod, distance)` pairs.
    pub fn from_pairs(pairs: &[(u8, f32)]) -> Self {
        Self::new(pairs.iter().map(|&(lod, d)| LodInfo::new(lod, d)).collect())
    }

    /// Index into the table for a chunk `distance` away.
    ///
    /// Walks the rows nearest-first and returns the first whose threshold is
    /// not exceeded. Distances beyond every threshold return the last index.
    pub fn select(&self, distance: f32) -> usize {
        self.levels
            .iter()
            .position(|info| distance <= info.visible_distance)
            .unwrap_or(self.levels.len() - 1)
    }

    /// Furthest distance at which any chunk is visible.
    pub fn max_view_distance(&self) -> f32 {
        self.levels
            .last()
            .map(|info| info.visible_distance)
            .unwrap_or(0.0)
    }

    pub fn is_visible(&self, distance: f32) -> bool {
        distance <= self.max_view_distance()
    }

    /// Clamp a table index into range.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.levels.len() - 1)
    }

    pub fn get(&self, index: usize) -> Option<&LodInfo> {
        self.levels.get(index)
    }

    pub fn levels(&self) -> &[LodInfo] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for LodTable {
    fn default() -> Self {
        Self {
            levels: vec![
                LodInfo::new(0, 200.0),
                LodInfo::new(1, 400.0),
                LodInfo::new(4, 600.0),
            ],
        }
    }
}

impl From<Vec<LodInfo>> for LodTable {
    fn from(levels: Vec<LodInfo>) -> Self {
        Self::new(levels)
    }
}

impl From<LodTable> for Vec<LodInfo> {
    fn from(table: LodTable) -> Self {
        table.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LodTable {
        LodTable::from_pairs(&[(0, 100.0), (1, 300.0), (2, 600.0)])
    }

    #[test]
    fn test_reference_distances() {
        let table = table();
        assert_eq!(table.select(50.0), 0);
        assert_eq!(table.select(250.0), 1);
        assert_eq!(table.select(650.0), 2);
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        let table = table();
        assert_eq!(table.select(0.0), 0);
        assert_eq!(table.select(100.0), 0);
        assert_eq!(table.select(100.001), 1);
        assert_eq!(table.select(600.0), 2);
    }

    #[test]
    fn test_selection_is_monotonic() {
        let table = table();
        let mut prev = 0;
        for d in [0.0, 99.0, 150.0, 300.0, 301.0, 599.0, 1_000.0, f32::MAX] {
            let index = table.select(d);
            assert!(index >= prev, "LOD index must not decrease with distance at d={d}");
            prev = index;
        }
    }

    #[test]
    fn test_visibility_uses_furthest_threshold() {
        let table = table();
        assert_eq!(table.max_view_distance(), 600.0);
        assert!(table.is_visible(600.0));
        assert!(!table.is_visible(600.5));
    }

    #[test]
    fn test_construction_clamps() {
        let table = LodTable::from_pairs(&[(9, 300.0), (1, 100.0), (2, f32::NAN)]);
        assert_eq!(table.levels()[0].lod, MAX_MESH_LOD);
        assert_eq!(table.levels()[1].visible_distance, 300.0);
        assert_eq!(table.levels()[2].visible_distance, 300.0);
    }

    #[test]
    fn test_empty_table_falls_back_to_default() {
        assert_eq!(LodTable::new(Vec::new()), LodTable::default());
        assert!(!LodTable::default().is_empty());
    }

    #[test]
    fn test_clamp_index() {
        let table = table();
        assert_eq!(table.clamp_index(1), 1);
        assert_eq!(table.clamp_index(7), 2);
    }
}

//! Mesh resolution and scale settings shared by generation and streaming.

use serde::{Deserialize, Serialize};

/// Chunk edge lengths, in quads, that the mesher supports.
pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];
pub const NUM_SUPPORTED_CHUNK_SIZES: usize = SUPPORTED_CHUNK_SIZES.len();
/// Flat shading triples the vertex count, so only the smallest sizes are allowed.
pub const NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    /// World units per height-field sample.
    pub mesh_scale: f32,
    pub use_flat_shading: bool,
    /// Index into [`SUPPORTED_CHUNK_SIZES`].
    pub chunk_size_index: usize,
    /// Index into the first [`NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES`] sizes.
    pub flat_shaded_chunk_size_index: usize,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            mesh_scale: 5.0,
            use_flat_shading: false,
            chunk_size_index: 0,
            flat_shaded_chunk_size_index: 0,
        }
    }
}

impl MeshSettings {
    /// Clamp scale and size indices into the supported ranges.
    pub fn validate(&mut self) {
        self.mesh_scale = if self.mesh_scale.is_finite() {
            self.mesh_scale.max(0.01)
        } else {
            0.01
        };
        self.chunk_size_index = self.chunk_size_index.min(NUM_SUPPORTED_CHUNK_SIZES - 1);
        self.flat_shaded_chunk_size_index = self
            .flat_shaded_chunk_size_index
            .min(NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES - 1);
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// Vertices per mesh row at LOD 0, including the outer ring that only
    /// feeds normal calculation. Also the height-field resolution.
    pub fn num_vertices_per_line(&self) -> usize {
        let index = if self.use_flat_shading {
            self.flat_shaded_chunk_size_index
                .min(NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES - 1)
        } else {
            self.chunk_size_index.min(NUM_SUPPORTED_CHUNK_SIZES - 1)
        };
        SUPPORTED_CHUNK_SIZES[index] + 1
    }

    /// Edge length of one chunk in world units.
    pub fn mesh_world_size(&self) -> f32 {
        (self.num_vertices_per_line() - 3) as f32 * self.mesh_scale
    }
}

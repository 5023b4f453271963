//! Terrain meshing: mesh settings, mesh data, and the height-field grid mesher.

mod settings;
mod terrain_mesh;

pub use settings::{
    MeshSettings, NUM_SUPPORTED_CHUNK_SIZES, NUM_SUPPORTED_FLAT_SHADED_CHUNK_SIZES,
    SUPPORTED_CHUNK_SIZES,
};
pub use terrain_mesh::{GridMeshGenerator, MeshData, MeshGenerator, lod_increment};

//! Level-of-detail management: distance thresholds and per-chunk LOD selection.

mod selector;

pub use selector::{LodInfo, LodTable, MAX_MESH_LOD, NUM_SUPPORTED_LODS};

//! Chunk streaming: asynchronous generation of terrain tiles around a moving
//! observer, with LOD selection, colliders, water planes and object scatter.

mod chunk;
mod coord;
mod events;
mod placement;
mod settings;
mod streaming;
mod water;
mod work_queue;

pub use chunk::{ChunkState, LodMesh, MeshState, TerrainChunk};
pub use coord::{Bounds2, ChunkCoord};
pub use events::{ChunkEvent, ChunkEvents, ChunkListener};
pub use placement::{DiscardPlacer, ObjectPlacer, ScatterCategory, ScatterPoints, scatter_chunk};
pub use settings::StreamSettings;
pub use streaming::{ChunkStore, StreamingController, StreamingStats};
pub use water::{WaterPlane, WaterPlaneId, WaterPlanePool};
pub use work_queue::{WorkHandle, WorkQueue, WorkQueueError};

//! Chunk grid ownership and the per-tick streaming loop.
//!
//! [`ChunkStore`] owns every chunk ever created, the visible set, and the
//! water plane pool. [`StreamingController`] pairs it with the work queue
//! whose completions mutate it, and decides when to rescan the window around
//! the observer.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use strata_mesh::{GridMeshGenerator, MeshData, MeshGenerator};
use strata_terrain::HeightField;
use tracing::{debug, info, warn};

use crate::chunk::{ChunkContext, TerrainChunk};
use crate::coord::ChunkCoord;
use crate::events::{ChunkEvent, ChunkEvents};
use crate::placement::ObjectPlacer;
use crate::settings::StreamSettings;
use crate::water::WaterPlanePool;
use crate::work_queue::{WorkHandle, WorkQueue};

/// Running counters for a streaming session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    pub chunks_created: u64,
    pub height_map_requests: u64,
    pub mesh_requests: u64,
    pub colliders_installed: u64,
    /// Chunks that have run their scatter pass.
    pub scatter_passes: u64,
    /// Points handed to the placer across all chunks.
    pub objects_scattered: u64,
    /// Jobs that could not be started or panicked.
    pub failed_jobs: u64,
    pub running_jobs: usize,
    pub pending_completions: usize,
}

/// Every chunk created so far, keyed by coordinate. Chunks are never evicted.
pub struct ChunkStore {
    settings: StreamSettings,
    chunks: FxHashMap<ChunkCoord, TerrainChunk>,
    visible: Vec<ChunkCoord>,
    water: WaterPlanePool,
    placer: Box<dyn ObjectPlacer>,
    mesher: Arc<dyn MeshGenerator>,
    work: WorkHandle<ChunkStore>,
    events: ChunkEvents,
    stats: StreamingStats,
    observer: Vec2,
}

impl ChunkStore {
    pub(crate) fn new(
        settings: StreamSettings,
        mesher: Arc<dyn MeshGenerator>,
        placer: Box<dyn ObjectPlacer>,
        work: WorkHandle<ChunkStore>,
    ) -> Self {
        Self {
            water: WaterPlanePool::new(settings.water_level),
            settings,
            chunks: FxHashMap::default(),
            visible: Vec::new(),
            placer,
            mesher,
            work,
            events: ChunkEvents::new(),
            stats: StreamingStats::default(),
            observer: Vec2::ZERO,
        }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Coordinates of the chunks currently in view.
    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible
    }

    pub fn water(&self) -> &WaterPlanePool {
        &self.water
    }

    pub fn observer(&self) -> Vec2 {
        self.observer
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChunkEvent) + 'static) {
        self.events.subscribe(listener);
    }

    /// Create and load the chunk at `coord` if it does not exist yet.
    ///
    /// Returns `false` when the chunk already existed.
    pub fn spawn_chunk(&mut self, coord: ChunkCoord) -> bool {
        if self.chunks.contains_key(&coord) {
            return false;
        }
        self.chunks
            .insert(coord, TerrainChunk::new(coord, &self.settings));
        self.stats.chunks_created += 1;
        debug!(%coord, "chunk created");

        let change = self.with_chunk(coord, |chunk, ctx| chunk.load(ctx)).flatten();
        self.apply_visibility(coord, change);
        true
    }

    /// Completion of one layer's height-field request.
    pub(crate) fn on_height_field(&mut self, coord: ChunkCoord, field: HeightField) {
        match self.with_chunk(coord, |chunk, ctx| chunk.receive_height_field(field, ctx)) {
            Some(change) => self.apply_visibility(coord, change),
            None => warn!(%coord, "height field for unknown chunk"),
        }
    }

    /// Completion of a mesh request.
    pub(crate) fn on_mesh_ready(&mut self, coord: ChunkCoord, lod_index: usize, mesh: MeshData) {
        let collider_index = self.settings.collider_lod_index;
        let result = self.with_chunk(coord, |chunk, ctx| {
            chunk.receive_mesh(lod_index, mesh);
            let change = chunk.update(ctx);
            if lod_index == collider_index {
                chunk.update_collision(ctx);
            }
            change
        });
        match result {
            Some(change) => self.apply_visibility(coord, change),
            None => warn!(%coord, lod_index, "mesh for unknown chunk"),
        }
    }

    /// Re-run the near-collider check on every visible chunk.
    pub(crate) fn update_collisions(&mut self) {
        for coord in self.visible.clone() {
            self.with_chunk(coord, |chunk, ctx| chunk.update_collision(ctx));
        }
    }

    /// Refresh the visible chunks, then every coordinate in the square
    /// window around the observer, creating chunks that do not exist yet.
    pub(crate) fn update_visible_chunks(&mut self) {
        let mut updated = FxHashSet::default();
        for coord in self.visible.clone().into_iter().rev() {
            updated.insert(coord);
            self.update_chunk(coord);
        }

        let center = ChunkCoord::from_world(self.observer, self.settings.chunk_world_size());
        let reach = self.settings.chunks_visible_in_view_distance();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let coord = center.offset(dx, dy);
                if updated.contains(&coord) {
                    continue;
                }
                if self.chunks.contains_key(&coord) {
                    self.update_chunk(coord);
                } else {
                    self.spawn_chunk(coord);
                }
            }
        }
    }

    fn update_chunk(&mut self, coord: ChunkCoord) {
        let change = self.with_chunk(coord, |chunk, ctx| chunk.update(ctx)).flatten();
        self.apply_visibility(coord, change);
    }

    fn apply_visibility(&mut self, coord: ChunkCoord, change: Option<bool>) {
        match change {
            Some(true) if !self.visible.contains(&coord) => self.visible.push(coord),
            Some(false) => self.visible.retain(|&c| c != coord),
            _ => {}
        }
    }

    /// Run `f` on one chunk with mutable access to the rest of the store.
    fn with_chunk<R>(
        &mut self,
        coord: ChunkCoord,
        f: impl FnOnce(&mut TerrainChunk, &mut ChunkContext<'_>) -> R,
    ) -> Option<R> {
        let Self {
            settings,
            chunks,
            water,
            placer,
            mesher,
            work,
            events,
            stats,
            observer,
            ..
        } = self;
        let chunk = chunks.get_mut(&coord)?;
        let mut ctx = ChunkContext {
            settings,
            observer: *observer,
            work,
            mesher,
            water,
            placer: placer.as_mut(),
            events,
            stats,
        };
        Some(f(chunk, &mut ctx))
    }
}

/// Drives a [`ChunkStore`] from observer positions, one tick at a time.
pub struct StreamingController {
    queue: WorkQueue<ChunkStore>,
    store: ChunkStore,
    last_observer: Option<Vec2>,
    last_scan: Option<Vec2>,
}

impl StreamingController {
    /// Validates `settings` before use.
    pub fn new(
        settings: StreamSettings,
        mesher: Arc<dyn MeshGenerator>,
        placer: Box<dyn ObjectPlacer>,
    ) -> Self {
        let settings = settings.validated();
        info!(
            chunk_world_size = settings.chunk_world_size(),
            field_size = settings.field_size(),
            view_distance = settings.lod_table.max_view_distance(),
            layers = settings.enabled_layers().count(),
            "streaming controller created"
        );
        let queue = WorkQueue::new();
        let store = ChunkStore::new(settings, mesher, placer, queue.handle());
        Self {
            queue,
            store,
            last_observer: None,
            last_scan: None,
        }
    }

    /// Controller using the default [`GridMeshGenerator`].
    pub fn with_grid_mesher(settings: StreamSettings, placer: Box<dyn ObjectPlacer>) -> Self {
        Self::new(settings, Arc::new(GridMeshGenerator), placer)
    }

    /// Advance one tick with the observer at `observer` on the ground plane.
    ///
    /// Applies finished work first, then refreshes colliders if the observer
    /// moved, then rescans the window if it moved past the threshold since
    /// the last scan. The first tick always scans. Returns the number of
    /// completions applied.
    pub fn tick(&mut self, observer: Vec2) -> usize {
        self.store.observer = observer;
        let completed = self.queue.drain(&mut self.store);

        if self.last_observer != Some(observer) {
            self.store.update_collisions();
        }
        self.last_observer = Some(observer);

        let threshold = self.store.settings.viewer_move_threshold;
        let rescan = self
            .last_scan
            .is_none_or(|last| last.distance_squared(observer) > threshold * threshold);
        if rescan {
            self.last_scan = Some(observer);
            self.store.update_visible_chunks();
        }
        completed
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChunkEvent) + 'static) {
        self.store.subscribe(listener);
    }

    pub fn stats(&self) -> StreamingStats {
        let mut stats = self.store.stats;
        stats.failed_jobs += self.queue.failed();
        stats.running_jobs = self.queue.running();
        stats.pending_completions = self.queue.pending();
        stats
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChunkStore {
        &mut self.store
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.store.chunk(coord)
    }

    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        self.store.visible_chunks()
    }

    /// Block until no generation job is running. See [`WorkQueue::wait_idle`].
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.queue.wait_idle(timeout)
    }
}

//! A single terrain tile and its generation state machine.
//!
//! A chunk asks for one height field per enabled layer, then for one mesh per
//! LOD it is viewed at, and finally scatters objects and installs its collider
//! when the observer comes close. All transitions run on the thread that owns
//! the [`ChunkStore`](crate::ChunkStore); worker results arrive through its
//! completion callbacks.

use std::sync::Arc;

use glam::Vec2;
use rustc_hash::FxHashMap;
use strata_mesh::{MeshData, MeshGenerator};
use strata_terrain::{HeightField, combine, composite_layer};
use tracing::{debug, error};

use crate::coord::{Bounds2, ChunkCoord};
use crate::events::{ChunkEvent, ChunkEvents};
use crate::placement::{ObjectPlacer, scatter_chunk};
use crate::settings::StreamSettings;
use crate::streaming::{ChunkStore, StreamingStats};
use crate::water::{WaterPlaneId, WaterPlanePool};
use crate::work_queue::WorkHandle;

/// Height-map progress of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Unrequested,
    HeightMapsPending,
    HeightMapsReady,
}

/// Progress of one LOD mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshState {
    Unrequested,
    Pending,
    Ready,
}

/// Cached mesh slot for one row of the LOD table.
#[derive(Clone, Debug)]
pub struct LodMesh {
    lod: u8,
    requested: bool,
    mesh: Option<Arc<MeshData>>,
}

impl LodMesh {
    fn new(lod: u8) -> Self {
        Self {
            lod,
            requested: false,
            mesh: None,
        }
    }

    pub fn lod(&self) -> u8 {
        self.lod
    }

    pub fn state(&self) -> MeshState {
        match (self.requested, &self.mesh) {
            (_, Some(_)) => MeshState::Ready,
            (true, None) => MeshState::Pending,
            (false, None) => MeshState::Unrequested,
        }
    }

    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        self.mesh.as_ref()
    }
}

/// Everything a chunk touches besides itself while it updates.
pub(crate) struct ChunkContext<'a> {
    pub settings: &'a StreamSettings,
    pub observer: Vec2,
    pub work: &'a WorkHandle<ChunkStore>,
    pub mesher: &'a Arc<dyn MeshGenerator>,
    pub water: &'a mut WaterPlanePool,
    pub placer: &'a mut dyn ObjectPlacer,
    pub events: &'a mut ChunkEvents,
    pub stats: &'a mut StreamingStats,
}

pub struct TerrainChunk {
    coord: ChunkCoord,
    world_center: Vec2,
    sample_center: Vec2,
    bounds: Bounds2,
    visible: bool,
    /// LOD table index of the attached mesh.
    previous_lod: Option<usize>,
    layer_fields: FxHashMap<String, HeightField>,
    expected_fields: usize,
    received_fields: usize,
    height_maps_requested: bool,
    lod_meshes: Vec<LodMesh>,
    combined: Option<Arc<HeightField>>,
    water_plane: Option<WaterPlaneId>,
    objects_scattered: bool,
    has_collider: bool,
}

impl TerrainChunk {
    pub(crate) fn new(coord: ChunkCoord, settings: &StreamSettings) -> Self {
        let world_size = settings.chunk_world_size();
        Self {
            coord,
            world_center: coord.world_center(world_size),
            sample_center: coord.sample_center(world_size, settings.mesh.mesh_scale),
            bounds: Bounds2::for_chunk(coord, world_size),
            visible: false,
            previous_lod: None,
            layer_fields: FxHashMap::default(),
            expected_fields: 0,
            received_fields: 0,
            height_maps_requested: false,
            lod_meshes: settings
                .lod_table
                .levels()
                .iter()
                .map(|info| LodMesh::new(info.lod))
                .collect(),
            combined: None,
            water_plane: None,
            objects_scattered: false,
            has_collider: false,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn world_center(&self) -> Vec2 {
        self.world_center
    }

    /// Centre in noise sample space.
    pub fn sample_center(&self) -> Vec2 {
        self.sample_center
    }

    pub fn bounds(&self) -> Bounds2 {
        self.bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// LOD table index of the attached mesh, if any.
    pub fn lod_index(&self) -> Option<usize> {
        self.previous_lod
    }

    pub fn state(&self) -> ChunkState {
        if !self.height_maps_requested {
            ChunkState::Unrequested
        } else if self.received_fields < self.expected_fields {
            ChunkState::HeightMapsPending
        } else {
            ChunkState::HeightMapsReady
        }
    }

    fn height_maps_ready(&self) -> bool {
        self.state() == ChunkState::HeightMapsReady
    }

    /// Received height fields by layer id, for texturing.
    pub fn height_fields(&self) -> &FxHashMap<String, HeightField> {
        &self.layer_fields
    }

    pub fn height_field(&self, layer_id: &str) -> Option<&HeightField> {
        self.layer_fields.get(layer_id)
    }

    pub fn lod_mesh(&self, lod_index: usize) -> Option<&LodMesh> {
        self.lod_meshes.get(lod_index)
    }

    pub fn active_mesh(&self) -> Option<&Arc<MeshData>> {
        self.previous_lod
            .and_then(|i| self.lod_meshes.get(i))
            .and_then(LodMesh::mesh)
    }

    /// Sum of the terrain-contributing layers, once it has been needed.
    pub fn combined_field(&self) -> Option<&HeightField> {
        self.combined.as_deref()
    }

    pub fn water_plane(&self) -> Option<WaterPlaneId> {
        self.water_plane
    }

    pub fn objects_scattered(&self) -> bool {
        self.objects_scattered
    }

    pub fn has_collider(&self) -> bool {
        self.has_collider
    }

    /// Request one height field per enabled layer.
    ///
    /// Returns a visibility change if the chunk was immediately ready, which
    /// only happens when no layer is enabled.
    pub(crate) fn load(&mut self, ctx: &mut ChunkContext<'_>) -> Option<bool> {
        let layers: Vec<_> = ctx.settings.enabled_layers().cloned().collect();
        // The count must be final before any completion can be applied.
        self.expected_fields = layers.len();
        self.height_maps_requested = true;

        let size = ctx.settings.field_size();
        let center = self.sample_center;
        let coord = self.coord;
        for layer in layers {
            let id = layer.id.clone();
            let submitted = ctx.work.submit(
                move || composite_layer(size, &layer, center),
                move |store: &mut ChunkStore, field| store.on_height_field(coord, field),
            );
            match submitted {
                Ok(()) => ctx.stats.height_map_requests += 1,
                Err(err) => {
                    ctx.stats.failed_jobs += 1;
                    error!(%coord, layer = %id, %err, "height map request failed");
                }
            }
        }

        if self.expected_fields == 0 {
            return self.update(ctx);
        }
        None
    }

    pub(crate) fn receive_height_field(
        &mut self,
        field: HeightField,
        ctx: &mut ChunkContext<'_>,
    ) -> Option<bool> {
        let id = field.layer_id().unwrap_or_default().to_string();
        self.layer_fields.insert(id, field);
        self.received_fields += 1;

        if self.received_fields < self.expected_fields {
            return None;
        }
        debug!(coord = %self.coord, layers = self.received_fields, "height maps ready");
        self.update(ctx)
    }

    pub(crate) fn receive_mesh(&mut self, lod_index: usize, mesh: MeshData) {
        match self.lod_meshes.get_mut(lod_index) {
            Some(slot) => slot.mesh = Some(Arc::new(mesh)),
            None => error!(coord = %self.coord, lod_index, "mesh for unknown LOD index"),
        }
    }

    /// Re-evaluate visibility and LOD against the observer.
    ///
    /// Returns `Some(visible)` when visibility flipped.
    pub(crate) fn update(&mut self, ctx: &mut ChunkContext<'_>) -> Option<bool> {
        if !self.height_maps_ready() {
            return None;
        }

        let settings = ctx.settings;
        let table = &settings.lod_table;
        let distance = self.bounds.distance(ctx.observer);
        let was_visible = self.visible;
        let visible = table.is_visible(distance);

        if visible {
            let lod_index = table.select(distance);
            // Follows the selected LOD even while its mesh is still pending.
            self.update_water(lod_index == 0, ctx.water);
            if self.previous_lod != Some(lod_index) {
                if self.lod_meshes[lod_index].mesh.is_some() {
                    self.previous_lod = Some(lod_index);
                    ctx.events.emit(&ChunkEvent::MeshAttached {
                        coord: self.coord,
                        lod_index,
                        lod: self.lod_meshes[lod_index].lod,
                    });
                    if lod_index == 0 && !self.objects_scattered {
                        self.scatter_objects(ctx);
                    }
                } else if !self.lod_meshes[lod_index].requested {
                    self.request_mesh(lod_index, ctx);
                }
            }
        }

        if was_visible == visible {
            return None;
        }
        self.visible = visible;
        if !visible {
            self.update_water(false, ctx.water);
            self.previous_lod = None;
        }
        debug!(coord = %self.coord, visible, "visibility changed");
        ctx.events.emit(&ChunkEvent::VisibilityChanged {
            coord: self.coord,
            visible,
        });
        Some(visible)
    }

    /// Request the collider mesh when near, and install it once when very near.
    pub(crate) fn update_collision(&mut self, ctx: &mut ChunkContext<'_>) {
        if self.has_collider || !self.height_maps_ready() {
            return;
        }

        let settings = ctx.settings;
        let index = settings.lod_table.clamp_index(settings.collider_lod_index);
        let sqr_distance = self.bounds.sqr_distance(ctx.observer);
        let request_threshold = settings
            .lod_table
            .get(index)
            .map_or(0.0, |info| info.sqr_visible_distance());

        if sqr_distance < request_threshold && !self.lod_meshes[index].requested {
            self.request_mesh(index, ctx);
        }

        let install = settings.collider_generation_distance;
        if sqr_distance < install * install && self.lod_meshes[index].mesh.is_some() {
            self.has_collider = true;
            ctx.stats.colliders_installed += 1;
            debug!(coord = %self.coord, lod_index = index, "collider installed");
            ctx.events.emit(&ChunkEvent::ColliderInstalled { coord: self.coord });
        }
    }

    fn update_water(&mut self, wanted: bool, pool: &mut WaterPlanePool) {
        match (wanted, self.water_plane) {
            (true, None) => self.water_plane = Some(pool.acquire(self.world_center)),
            (false, Some(id)) => {
                pool.release(id);
                self.water_plane = None;
            }
            _ => {}
        }
    }

    /// Sum of the terrain-contributing layers, built on first use.
    fn combined_terrain(&mut self, size: usize) -> Arc<HeightField> {
        if let Some(combined) = &self.combined {
            return Arc::clone(combined);
        }
        // Sorted so the float sum does not depend on map order.
        let mut fields: Vec<(&String, &HeightField)> = self
            .layer_fields
            .iter()
            .filter(|(_, field)| field.contributes_to_terrain())
            .collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        let combined = Arc::new(combine(size, fields.into_iter().map(|(_, field)| field)));
        self.combined = Some(Arc::clone(&combined));
        combined
    }

    fn request_mesh(&mut self, lod_index: usize, ctx: &mut ChunkContext<'_>) {
        let heights = self.combined_terrain(ctx.settings.field_size());
        let slot = &mut self.lod_meshes[lod_index];
        slot.requested = true;

        let lod = slot.lod;
        let coord = self.coord;
        let mesher = Arc::clone(ctx.mesher);
        let mesh_settings = ctx.settings.mesh.clone();
        let submitted = ctx.work.submit(
            move || mesher.generate(&heights, &mesh_settings, lod),
            move |store: &mut ChunkStore, mesh| store.on_mesh_ready(coord, lod_index, mesh),
        );
        match submitted {
            Ok(()) => {
                ctx.stats.mesh_requests += 1;
                debug!(%coord, lod_index, lod, "mesh requested");
            }
            Err(err) => {
                ctx.stats.failed_jobs += 1;
                error!(%coord, lod_index, %err, "mesh request failed");
            }
        }
    }

    fn scatter_objects(&mut self, ctx: &mut ChunkContext<'_>) {
        let combined = self.combined_terrain(ctx.settings.field_size());
        let region_size = ctx.settings.chunk_world_size();
        let points = scatter_chunk(
            &ctx.settings.scatter,
            ctx.settings.world_seed,
            self.coord,
            &self.layer_fields,
            &combined,
            region_size,
        );
        let point_count = points.values().map(Vec::len).sum();

        ctx.placer
            .place(self.coord, &points, self.world_center, &combined, region_size);
        self.objects_scattered = true;
        ctx.stats.scatter_passes += 1;
        ctx.stats.objects_scattered += point_count as u64;
        debug!(coord = %self.coord, point_count, "objects scattered");
        ctx.events.emit(&ChunkEvent::ObjectsScattered {
            coord: self.coord,
            point_count,
        });
    }
}

//! Object scattering and the hand-off to whoever instantiates the objects.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strata_terrain::{HeightField, PoissonSampleSpec, derive_chunk_seed, generate_points};

use crate::coord::ChunkCoord;

/// Scatter points per category name, in chunk-local region space
/// (`[0, region_size]` on both axes).
pub type ScatterPoints = BTreeMap<String, Vec<Vec2>>;

/// One kind of scattered object and how densely it is placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterCategory {
    pub name: String,
    /// Layer whose field drives spacing; the combined terrain field is used
    /// when unset or when the chunk has no such layer.
    pub density_layer: Option<String>,
    pub spec: PoissonSampleSpec,
}

impl Default for ScatterCategory {
    fn default() -> Self {
        Self {
            name: "trees".to_string(),
            density_layer: None,
            spec: PoissonSampleSpec::default(),
        }
    }
}

/// Receives a chunk's scatter points once it first reaches full detail.
///
/// Runs on the thread that owns the chunk store.
pub trait ObjectPlacer {
    fn place(
        &mut self,
        coord: ChunkCoord,
        points: &ScatterPoints,
        chunk_center: Vec2,
        combined: &HeightField,
        region_size: f32,
    );
}

/// Lets the caller keep a handle to a placer after handing it to the store.
impl<P: ObjectPlacer + ?Sized> ObjectPlacer for Rc<RefCell<P>> {
    fn place(
        &mut self,
        coord: ChunkCoord,
        points: &ScatterPoints,
        chunk_center: Vec2,
        combined: &HeightField,
        region_size: f32,
    ) {
        self.borrow_mut()
            .place(coord, points, chunk_center, combined, region_size);
    }
}

/// Placer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardPlacer;

impl ObjectPlacer for DiscardPlacer {
    fn place(&mut self, _: ChunkCoord, _: &ScatterPoints, _: Vec2, _: &HeightField, _: f32) {}
}

/// Sample every category over a `region_size` square of chunk `coord`.
///
/// Seeds derive from the world seed, coordinate and category name, so the
/// result does not depend on which chunk was scattered first.
pub fn scatter_chunk(
    categories: &[ScatterCategory],
    world_seed: u64,
    coord: ChunkCoord,
    layer_fields: &FxHashMap<String, HeightField>,
    combined: &HeightField,
    region_size: f32,
) -> ScatterPoints {
    let region = Vec2::splat(region_size);
    categories
        .iter()
        .map(|category| {
            let field = category
                .density_layer
                .as_deref()
                .and_then(|id| layer_fields.get(id))
                .unwrap_or(combined);
            let seed = derive_chunk_seed(world_seed, coord.as_tuple(), &category.name);
            let points = generate_points(&category.spec, region, field, seed);
            (category.name.clone(), points)
        })
        .collect()
}

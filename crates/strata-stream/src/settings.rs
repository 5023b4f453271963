//! Parameters of a streaming session.

use serde::{Deserialize, Serialize};
use strata_lod::LodTable;
use strata_mesh::MeshSettings;
use strata_terrain::{HeightLayer, LayerEntry, NoiseConfig, NormalizeMode, ResponseCurve};

use crate::placement::ScatterCategory;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Seeds object scattering; noise layers carry their own seeds.
    pub world_seed: u64,
    pub mesh: MeshSettings,
    pub layers: Vec<LayerEntry>,
    pub lod_table: LodTable,
    /// Row of `lod_table` whose mesh doubles as the collider.
    pub collider_lod_index: usize,
    /// Observer distance under which a ready collider mesh is installed.
    pub collider_generation_distance: f32,
    /// Observer travel that triggers a rescan of the visible window.
    pub viewer_move_threshold: f32,
    pub water_level: f32,
    pub scatter: Vec<ScatterCategory>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            world_seed: 0,
            mesh: MeshSettings::default(),
            layers: vec![
                LayerEntry {
                    enabled: true,
                    layer: HeightLayer {
                        id: "height".to_string(),
                        noise: NoiseConfig {
                            normalize_mode: NormalizeMode::Global,
                            ..Default::default()
                        },
                        curve: ResponseCurve::linear(&[(0.0, 0.0), (0.3, 0.05), (1.0, 1.0)]),
                        amplitude: 60.0,
                        use_for_terrain: true,
                    },
                },
                LayerEntry {
                    enabled: true,
                    layer: HeightLayer {
                        id: "forest".to_string(),
                        noise: NoiseConfig {
                            seed: 1,
                            scale: 120.0,
                            octaves: 3,
                            normalize_mode: NormalizeMode::Global,
                            ..Default::default()
                        },
                        curve: ResponseCurve::identity(),
                        amplitude: 1.0,
                        use_for_terrain: false,
                    },
                },
            ],
            lod_table: LodTable::default(),
            collider_lod_index: 0,
            collider_generation_distance: 10.0,
            viewer_move_threshold: 25.0,
            water_level: 3.0,
            scatter: vec![ScatterCategory {
                density_layer: Some("forest".to_string()),
                ..Default::default()
            }],
        }
    }
}

impl StreamSettings {
    /// Clamp every field into its supported range.
    pub fn validate(&mut self) {
        self.mesh.validate();
        for entry in &mut self.layers {
            entry.layer.validate();
        }
        self.collider_lod_index = self.lod_table.clamp_index(self.collider_lod_index);
        self.collider_generation_distance = non_negative(self.collider_generation_distance);
        self.viewer_move_threshold = non_negative(self.viewer_move_threshold);
        if !self.water_level.is_finite() {
            self.water_level = 0.0;
        }
        for category in &mut self.scatter {
            category.spec.validate();
        }
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// Height-field resolution of every chunk.
    pub fn field_size(&self) -> usize {
        self.mesh.num_vertices_per_line()
    }

    pub fn chunk_world_size(&self) -> f32 {
        self.mesh.mesh_world_size()
    }

    /// Chunk rings scanned around the observer's chunk.
    pub fn chunks_visible_in_view_distance(&self) -> i32 {
        (self.lod_table.max_view_distance() / self.chunk_world_size()).round() as i32
    }

    pub fn enabled_layers(&self) -> impl Iterator<Item = &HeightLayer> {
        strata_terrain::enabled_layers(&self.layers)
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

//! Height-field to triangle mesh conversion.
//!
//! The outermost ring of height samples is never emitted; it only feeds the
//! central differences used for smooth normals, so adjacent chunks shade
//! seamlessly.

use glam::Vec3;
use strata_terrain::HeightField;

use crate::settings::MeshSettings;

/// Triangle mesh output, ready for upload by a presentation layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    /// Mesh LOD level this mesh was built at.
    pub lod: u8,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Builds a mesh from a height field. Runs on worker threads.
pub trait MeshGenerator: Send + Sync {
    fn generate(&self, heights: &HeightField, settings: &MeshSettings, lod: u8) -> MeshData;
}

/// Sample stride for a mesh LOD level: 1 at full detail, otherwise `2 * lod`.
pub fn lod_increment(lod: u8) -> usize {
    if lod == 0 { 1 } else { lod as usize * 2 }
}

/// Regular-grid mesher over the interior of the height field.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridMeshGenerator;

impl GridMeshGenerator {
    /// Interior sample indices visited at `increment`, always ending on the
    /// last interior sample so the chunk edge is closed.
    fn interior_indices(size: usize, increment: usize) -> Vec<usize> {
        let last = size - 2;
        let mut indices: Vec<usize> = (1..=last).step_by(increment).collect();
        if indices.last() != Some(&last) {
            indices.push(last);
        }
        indices
    }
}

impl MeshGenerator for GridMeshGenerator {
    fn generate(&self, heights: &HeightField, settings: &MeshSettings, lod: u8) -> MeshData {
        let size = heights.size();
        let mut mesh = MeshData {
            lod,
            ..Default::default()
        };
        if size < 4 {
            return mesh;
        }

        let spacing = settings.mesh_scale;
        let span = (size - 3) as f32;
        let world_size = span * spacing;
        let samples = Self::interior_indices(size, lod_increment(lod));
        let line = samples.len();

        for &j in &samples {
            for &i in &samples {
                let u = (i - 1) as f32 / span;
                let v = (j - 1) as f32 / span;
                let h = heights.get(i, j);
                mesh.positions
                    .push([(u - 0.5) * world_size, h, (0.5 - v) * world_size]);
                mesh.uvs.push([u, v]);

                let left = heights.get(i - 1, j);
                let right = heights.get(i + 1, j);
                let up = heights.get(i, j - 1);
                let down = heights.get(i, j + 1);
                let normal = Vec3::new(left - right, 2.0 * spacing, down - up).normalize_or(Vec3::Y);
                mesh.normals.push(normal.to_array());
            }
        }

        for row in 0..line - 1 {
            for col in 0..line - 1 {
                let a = (row * line + col) as u32;
                let b = a + 1;
                let c = a + line as u32;
                let d = c + 1;
                mesh.indices.extend_from_slice(&[a, d, c, d, a, b]);
            }
        }

        if settings.use_flat_shading {
            flat_shade(&mut mesh);
        }
        mesh
    }
}

/// Give every triangle its own three vertices and a face normal.
fn flat_shade(mesh: &mut MeshData) {
    let mut positions = Vec::with_capacity(mesh.indices.len());
    let mut normals = Vec::with_capacity(mesh.indices.len());
    let mut uvs = Vec::with_capacity(mesh.indices.len());

    for tri in mesh.indices.chunks_exact(3) {
        let [p0, p1, p2] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
        let mut normal = (p1 - p0).cross(p2 - p0).normalize_or(Vec3::Y);
        if normal.y < 0.0 {
            normal = -normal;
        }
        for &i in tri {
            positions.push(mesh.positions[i as usize]);
            uvs.push(mesh.uvs[i as usize]);
            normals.push(normal.to_array());
        }
    }

    mesh.indices = (0..positions.len() as u32).collect();
    mesh.positions = positions;
    mesh.normals = normals;
    mesh.uvs = uvs;
}

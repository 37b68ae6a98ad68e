use bevy::math::Vec3;
use bevy::prelude::Mesh;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use hz_core::{HeightCurve, HeightGrid};

/// Triangle mesh for one chunk at one level of detail.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub lod: u32,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Upload-ready Bevy mesh.
    pub fn to_mesh(&self) -> Mesh {
        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone())
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone())
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone())
            .with_inserted_indices(Indices::U32(self.indices.clone()))
    }
}

/// Sample stride for a level of detail.
pub fn simplification_increment(lod: u32) -> usize {
    if lod == 0 {
        1
    } else {
        lod as usize * 2
    }
}

/// Sample indices along one axis of a bordered grid.
///
/// Always includes both border samples and both outermost interior samples;
/// the last interior step is shortened when the stride does not divide the
/// interior span.
fn axis_samples(bordered_size: usize, increment: usize) -> Vec<usize> {
    let last_interior = bordered_size - 2;
    let mut samples = vec![0];
    let mut i = 1;
    while i < last_interior {
        samples.push(i);
        i += increment;
    }
    samples.push(last_interior);
    samples.push(bordered_size - 1);
    samples
}

/// Vertex slot: interior vertices are emitted, border vertices only feed normals.
#[derive(Clone, Copy)]
enum Slot {
    Mesh(u32),
    Border(usize),
}

/// Build the render mesh for a bordered height grid.
///
/// Vertices sit at their sample's chunk-local position, centred on the chunk,
/// with +x along grid columns and -z along grid rows. Border samples shape
/// the edge normals but produce no triangles.
pub fn build_terrain_mesh(
    height_map: &HeightGrid,
    height_multiplier: f32,
    height_curve: &HeightCurve,
    lod: u32,
) -> MeshData {
    let bordered_size = height_map.width.min(height_map.height);
    if bordered_size < 3 {
        return MeshData {
            lod,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
        };
    }

    let increment = simplification_increment(lod);
    let samples = axis_samples(bordered_size, increment);
    let line = samples.len();

    let mesh_size = bordered_size - 2;
    let span = (mesh_size - 1).max(1) as f32;
    let top_left_x = (mesh_size - 1) as f32 / -2.0;
    let top_left_z = (mesh_size - 1) as f32 / 2.0;

    let mut slots = Vec::with_capacity(line * line);
    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut border_positions = Vec::new();

    for (row, &y) in samples.iter().enumerate() {
        for (col, &x) in samples.iter().enumerate() {
            let local_x = x as f32 - 1.0;
            let local_y = y as f32 - 1.0;
            let height = height_curve.evaluate(height_map.get(x, y)) * height_multiplier;
            let position = [top_left_x + local_x, height, top_left_z - local_y];

            let is_border = row == 0 || col == 0 || row == line - 1 || col == line - 1;
            if is_border {
                slots.push(Slot::Border(border_positions.len()));
                border_positions.push(position);
            } else {
                slots.push(Slot::Mesh(positions.len() as u32));
                positions.push(position);
                uvs.push([local_x / span, local_y / span]);
            }
        }
    }

    let mut indices = Vec::new();
    let mut border_triangles = Vec::new();
    for row in 0..line - 1 {
        for col in 0..line - 1 {
            let a = slots[row * line + col];
            let b = slots[row * line + col + 1];
            let c = slots[(row + 1) * line + col];
            let d = slots[(row + 1) * line + col + 1];
            for triangle in [[a, d, c], [d, a, b]] {
                match triangle {
                    [Slot::Mesh(i), Slot::Mesh(j), Slot::Mesh(k)] => indices.extend([i, j, k]),
                    _ => border_triangles.push(triangle),
                }
            }
        }
    }

    let normals = bake_normals(&positions, &border_positions, &indices, &border_triangles);

    MeshData {
        lod,
        positions,
        normals,
        uvs,
        indices,
    }
}

fn bake_normals(
    positions: &[[f32; 3]],
    border_positions: &[[f32; 3]],
    indices: &[u32],
    border_triangles: &[[Slot; 3]],
) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    let point = |slot: Slot| match slot {
        Slot::Mesh(i) => Vec3::from(positions[i as usize]),
        Slot::Border(i) => Vec3::from(border_positions[i]),
    };

    for triangle in indices.chunks_exact(3) {
        let slots = [Slot::Mesh(triangle[0]), Slot::Mesh(triangle[1]), Slot::Mesh(triangle[2])];
        let normal = surface_normal(slots.map(point));
        for &i in triangle {
            normals[i as usize] += normal;
        }
    }

    for &triangle in border_triangles {
        let normal = surface_normal(triangle.map(point));
        for slot in triangle {
            if let Slot::Mesh(i) = slot {
                normals[i as usize] += normal;
            }
        }
    }

    normals
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}

fn surface_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

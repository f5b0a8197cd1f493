//! Mesh builders shared by the integration tests.

#![allow(dead_code)]

use navpath::MeshBuffers;

/// 2x1 rectangle split along the (2, 0)-(0, 1) diagonal.
pub fn rectangle() -> MeshBuffers {
    MeshBuffers::new(
        vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ],
        vec![0, 1, 3, 1, 2, 3],
    )
}

/// Indexed `width` x `height` grid of unit cells in the XZ plane, each split along its
/// (x, z)-(x+1, z+1) diagonal. Vertices are laid out row by row.
pub fn grid_mesh(width: usize, height: usize) -> MeshBuffers {
    let mut vertices = Vec::with_capacity((width + 1) * (height + 1));
    for z in 0..=height {
        for x in 0..=width {
            vertices.push([x as f32, 0.0, z as f32]);
        }
    }
    let idx = |x: usize, z: usize| (z * (width + 1) + x) as u32;
    let mut indices = Vec::with_capacity(width * height * 6);
    for z in 0..height {
        for x in 0..width {
            indices.extend([idx(x, z), idx(x + 1, z), idx(x + 1, z + 1)]);
            indices.extend([idx(x, z), idx(x + 1, z + 1), idx(x, z + 1)]);
        }
    }
    MeshBuffers::new(vertices, indices)
}

/// Unit cells split like `grid_mesh`, emitted as an unwelded soup so shared corners go through
/// vertex merging.
pub fn cells(cells: &[(u32, u32)]) -> MeshBuffers {
    let mut vertices = Vec::with_capacity(cells.len() * 4);
    let mut indices = Vec::with_capacity(cells.len() * 6);
    for &(x, z) in cells {
        let (x, z) = (x as f32, z as f32);
        let base = vertices.len() as u32;
        vertices.extend([
            [x, 0.0, z],
            [x + 1.0, 0.0, z],
            [x + 1.0, 0.0, z + 1.0],
            [x, 0.0, z + 1.0],
        ]);
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshBuffers::new(vertices, indices)
}

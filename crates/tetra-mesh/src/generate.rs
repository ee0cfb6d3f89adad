//! Structured tetrahedral meshes.

use crate::{TetId, TetMesh, Tetrahedron, Vertex};

/// Axis orders walked from a cell's low corner to its high corner.
const KUHN_PATHS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Mesh the box `[0, nx] x [0, ny] x [0, nz]` with unit cells, each split
/// into six tetrahedra around its main diagonal.
///
/// Every cell is split the same way, so faces match across cells and the
/// result is conforming. Tetrahedra are positively oriented. `tag` receives
/// the `[i, j, k]` cell coordinates and returns the reference tag of the
/// cell's tetrahedra.
pub fn kuhn_box(nx: usize, ny: usize, nz: usize, mut tag: impl FnMut([usize; 3]) -> i32) -> TetMesh {
    let vertex_index = |i: usize, j: usize, k: usize| -> u32 {
        (1 + i + (nx + 1) * (j + (ny + 1) * k)) as u32
    };

    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push(Vertex::new([i as f64, j as f64, k as f64], 0));
            }
        }
    }

    let mut mesh = TetMesh::from_tables(vertices, Vec::with_capacity(6 * nx * ny * nz));
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let reference = tag([i, j, k]);
                for path in KUHN_PATHS {
                    let mut corner = [i, j, k];
                    let mut tet = [vertex_index(i, j, k); 4];
                    for (step, &axis) in path.iter().enumerate() {
                        corner[axis] += 1;
                        tet[step + 1] = vertex_index(corner[0], corner[1], corner[2]);
                    }
                    mesh.tetrahedra.push(Tetrahedron::new(tet, reference));
                }
            }
        }
    }

    for pos in 0..mesh.tetrahedra.len() {
        let negative = TetId::new(pos as u32 + 1)
            .and_then(|id| mesh.signed_volume(id))
            .is_some_and(|volume| volume < 0.0);
        if negative {
            mesh.tetrahedra[pos].vertices.swap(2, 3);
        }
    }

    mesh
}

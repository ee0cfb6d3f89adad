#![warn(missing_docs)]

//! Parallel tetrahedra neighbours and boundary surface extraction.
//!
//! The tetrahedron range is split into one contiguous block per worker.
//! Neighbours are found with a two-phase hash join:
//!
//! 1. every worker hashes the faces of its own block and links the pairs
//!    found inside it;
//! 2. after all tables are built, every worker probes the other workers'
//!    tables for its still-open faces.
//!
//! A worker only ever writes the neighbour slots of its own block, so the
//! phases need no locks, and the result is the same for any worker count.
//! The boundary and material-interface triangles are then extracted from
//! the finished adjacency in a single-threaded pass.
//!
//! # Example
//!
//! ```
//! use tetra_mesh::kuhn_box;
//! use tetra_neighbours::{extract_boundary, NeighbourSettings};
//!
//! let mut mesh = kuhn_box(2, 2, 2, |_| 0);
//! let report = extract_boundary(&mut mesh, &NeighbourSettings::with_workers(4)).unwrap();
//!
//! assert_eq!(report.boundary, 6 * 2 * 2 * 2);
//! assert_eq!(mesh.num_triangles(), report.boundary);
//! ```

mod adjacency;
mod cross;
pub mod error;
mod local;
pub mod partition;
pub mod pool;
pub mod surface;
mod table;

pub use adjacency::{Adjacency, FaceSlots};
pub use error::{NeighbourError, Result};
pub use partition::{partition, Block};
pub use pool::{resolve_workers, WorkerPool, MAX_WORKERS};
pub use surface::{extract_surface, Surface, BOUNDARY_TAG, INTERFACE_TAG};

use serde::{Deserialize, Serialize};
use tetra_mesh::TetMesh;
use tracing::{debug, trace};

use crate::cross::link_cross_faces;
use crate::local::link_local_faces;
use crate::table::FaceTable;

/// Neighbour computation parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourSettings {
    /// Requested number of workers, clamped to `[1, MAX_WORKERS]`; `0`
    /// uses every available hardware thread.
    pub workers: usize,
}

impl NeighbourSettings {
    /// Settings for `workers` workers.
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// The worker count actually used.
    pub fn resolved_workers(&self) -> usize {
        resolve_workers(self.workers)
    }
}

/// Finished adjacency and how it was obtained.
#[derive(Debug, Clone)]
pub struct Neighbours {
    /// Neighbour slots of every tetrahedron.
    pub adjacency: Adjacency,
    /// Number of workers used.
    pub workers: usize,
    /// Faces paired inside a block (Phase 1).
    pub local_pairs: usize,
    /// Slots filled from another block's table (Phase 2).
    pub cross_links: usize,
}

/// Summary of a boundary extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryReport {
    /// Number of workers used.
    pub workers: usize,
    /// Number of tetrahedra processed.
    pub tetrahedra: usize,
    /// Faces paired inside a block.
    pub local_pairs: usize,
    /// Slots filled across blocks.
    pub cross_links: usize,
    /// Triangles tagged [`BOUNDARY_TAG`].
    pub boundary: usize,
    /// Triangles tagged [`INTERFACE_TAG`].
    pub interfaces: usize,
}

/// Compute the neighbours of every tetrahedron of `mesh`.
pub fn compute_neighbours(mesh: &TetMesh, settings: &NeighbourSettings) -> Result<Neighbours> {
    let pool = WorkerPool::new(settings.workers)?;
    compute_neighbours_with(&pool, mesh)
}

/// Compute the neighbours of every tetrahedron of `mesh` on an existing pool.
pub fn compute_neighbours_with(pool: &WorkerPool, mesh: &TetMesh) -> Result<Neighbours> {
    mesh.validate()?;

    let count = mesh.num_tetrahedra();
    let workers = pool.workers();
    let mut adjacency = Adjacency::allocate(count)?;
    if count == 0 {
        return Ok(Neighbours {
            adjacency,
            workers,
            local_pairs: 0,
            cross_links: 0,
        });
    }

    let blocks = pool.blocks(count);
    let (local_pairs, cross_links) = {
        let mut views = adjacency.split_blocks(&blocks);

        let tables = pool.launch("local faces", &mut views, |view| {
            link_local_faces(mesh, view)
        })?;
        for (block, table) in blocks.iter().zip(&tables) {
            trace!(
                worker = block.worker,
                first = block.first,
                len = block.len,
                buckets = table.size(),
                overflow = table.overflow_len(),
                pairs = table.pairs(),
                "local faces hashed"
            );
        }
        let local_pairs: usize = tables.iter().map(FaceTable::pairs).sum();

        let cross_links: usize = if workers > 1 {
            pool.launch("cross faces", &mut views, |view| {
                link_cross_faces(mesh, &tables, view)
            })?
            .into_iter()
            .sum()
        } else {
            0
        };

        (local_pairs, cross_links)
    };
    debug!(
        tetrahedra = count,
        workers, local_pairs, cross_links, "neighbours computed"
    );

    Ok(Neighbours {
        adjacency,
        workers,
        local_pairs,
        cross_links,
    })
}

/// Compute neighbours, extract the boundary and interface triangles and
/// append them to the mesh's triangle table.
pub fn extract_boundary(mesh: &mut TetMesh, settings: &NeighbourSettings) -> Result<BoundaryReport> {
    let neighbours = compute_neighbours(mesh, settings)?;
    let surface = extract_surface(mesh, &neighbours.adjacency)?;
    debug!(
        boundary = surface.boundary,
        interfaces = surface.interfaces,
        "surface extracted"
    );

    let report = BoundaryReport {
        workers: neighbours.workers,
        tetrahedra: mesh.num_tetrahedra(),
        local_pairs: neighbours.local_pairs,
        cross_links: neighbours.cross_links,
        boundary: surface.boundary,
        interfaces: surface.interfaces,
    };
    mesh.append_triangles(surface.triangles);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};
    use tetra_mesh::{kuhn_box, FaceKey, MeshError, TetId, Tetrahedron, Triangle, Vertex};

    const WORKER_COUNTS: [usize; 6] = [1, 2, 3, 4, 7, 64];

    fn vertices(count: usize) -> Vec<Vertex> {
        (0..count)
            .map(|i| Vertex::new([i as f64, (i * i) as f64, (i % 3) as f64], 0))
            .collect()
    }

    /// Regions alternate like a checkerboard, so interfaces cross blocks.
    fn checkerboard() -> TetMesh {
        kuhn_box(4, 3, 2, |[i, j, k]| ((i + j + k) % 2) as i32 + 1)
    }

    fn boundary_of(mesh: &TetMesh, workers: usize) -> Surface {
        let neighbours = compute_neighbours(mesh, &NeighbourSettings::with_workers(workers)).unwrap();
        extract_surface(mesh, &neighbours.adjacency).unwrap()
    }

    fn as_set(surface: &Surface) -> BTreeSet<(FaceKey, i32)> {
        surface
            .triangles
            .iter()
            .map(|t| (FaceKey::new(t.vertices), t.reference))
            .collect()
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let mesh = checkerboard();
        for workers in WORKER_COUNTS {
            let adjacency = compute_neighbours(&mesh, &NeighbourSettings::with_workers(workers))
                .unwrap()
                .adjacency;
            for (id, slots) in adjacency.iter() {
                for (face, neighbour) in slots.iter().enumerate() {
                    let Some(other) = *neighbour else { continue };
                    let back = adjacency
                        .neighbours(other)
                        .iter()
                        .position(|&n| n == Some(id))
                        .unwrap_or_else(|| panic!("{other} does not link back to {id}"));
                    assert_eq!(mesh.tet(id).face_key(face), mesh.tet(other).face_key(back));
                }
                let degree = slots.iter().filter(|n| n.is_some()).count();
                assert_eq!(adjacency.degree(id) as usize, degree);
            }
        }
    }

    #[test]
    fn test_partition_invariance() {
        let mesh = checkerboard();
        let reference = boundary_of(&mesh, 1);
        let reference_adjacency = compute_neighbours(&mesh, &NeighbourSettings::with_workers(1))
            .unwrap()
            .adjacency;
        for workers in WORKER_COUNTS {
            let neighbours =
                compute_neighbours(&mesh, &NeighbourSettings::with_workers(workers)).unwrap();
            assert_eq!(neighbours.adjacency, reference_adjacency, "workers = {workers}");
            let surface = extract_surface(&mesh, &neighbours.adjacency).unwrap();
            assert_eq!(as_set(&surface), as_set(&reference), "workers = {workers}");
            assert_eq!(surface, reference);
        }
    }

    #[test]
    fn test_phase_counts_add_up() {
        let mesh = checkerboard();
        let single = compute_neighbours(&mesh, &NeighbourSettings::with_workers(1)).unwrap();
        assert_eq!(single.cross_links, 0);

        let split = compute_neighbours(&mesh, &NeighbourSettings::with_workers(4)).unwrap();
        assert!(split.cross_links > 0);
        // A cross-block pair is linked once from each side.
        assert_eq!(split.local_pairs * 2 + split.cross_links, single.local_pairs * 2);
    }

    #[test]
    fn test_every_face_linked_or_emitted_once() {
        let mesh = checkerboard();
        for workers in [1, 3, 5] {
            let adjacency = compute_neighbours(&mesh, &NeighbourSettings::with_workers(workers))
                .unwrap()
                .adjacency;
            let surface = extract_surface(&mesh, &adjacency).unwrap();

            let mut emitted: HashMap<FaceKey, usize> = HashMap::new();
            for triangle in &surface.triangles {
                *emitted.entry(FaceKey::new(triangle.vertices)).or_default() += 1;
            }
            assert!(emitted.values().all(|&n| n == 1));

            for (id, slots) in adjacency.iter() {
                let tet = mesh.tet(id);
                for (face, neighbour) in slots.iter().enumerate() {
                    let key = tet.face_key(face);
                    match neighbour {
                        None => assert!(emitted.contains_key(&key)),
                        Some(other) if mesh.tet(*other).reference == tet.reference => {
                            assert!(!emitted.contains_key(&key))
                        }
                        Some(_) => assert!(emitted.contains_key(&key)),
                    }
                }
            }
        }
    }

    #[test]
    fn test_interfaces_emitted_from_higher_index() {
        let mesh = checkerboard();
        let neighbours = compute_neighbours(&mesh, &NeighbourSettings::with_workers(3)).unwrap();
        let surface = extract_surface(&mesh, &neighbours.adjacency).unwrap();
        assert!(surface.interfaces > 0);

        let mut expected = 0;
        for (id, slots) in neighbours.adjacency.iter() {
            for other in slots.iter().flatten() {
                if mesh.tet(id).reference != mesh.tet(*other).reference && id > *other {
                    expected += 1;
                }
            }
        }
        assert_eq!(surface.interfaces, expected);
    }

    #[test]
    fn test_closed_mesh_has_no_surface() {
        // The boundary of a 4-simplex: five tets, every face shared twice.
        let tets = [
            [1, 2, 3, 4],
            [1, 2, 3, 5],
            [1, 2, 4, 5],
            [1, 3, 4, 5],
            [2, 3, 4, 5],
        ];
        let mesh = TetMesh::from_tables(
            vertices(5),
            tets.iter().map(|&v| Tetrahedron::new(v, 9)).collect(),
        );
        for workers in [1, 2, 5] {
            let neighbours =
                compute_neighbours(&mesh, &NeighbourSettings::with_workers(workers)).unwrap();
            assert!(mesh.tet_ids().all(|id| neighbours.adjacency.degree(id) == 4));
            let surface = extract_surface(&mesh, &neighbours.adjacency).unwrap();
            assert!(surface.triangles.is_empty());
        }
    }

    #[test]
    fn test_single_tet_emits_four_boundary_faces() {
        let mut mesh = TetMesh::from_tables(vertices(4), vec![Tetrahedron::new([1, 2, 3, 4], 5)]);
        let report = extract_boundary(&mut mesh, &NeighbourSettings::with_workers(8)).unwrap();
        assert_eq!(report.boundary, 4);
        assert_eq!(report.interfaces, 0);
        assert_eq!(mesh.num_triangles(), 4);
        assert!(mesh.triangles.iter().all(|t| t.reference == BOUNDARY_TAG));
    }

    #[test]
    fn test_cube_recovers_outer_faces() {
        let mut mesh = kuhn_box(1, 1, 1, |_| 1);
        let report = extract_boundary(&mut mesh, &NeighbourSettings::with_workers(2)).unwrap();
        assert_eq!(report.boundary, 12);
        assert_eq!(report.interfaces, 0);

        let center = nalgebra::Point3::new(0.5, 0.5, 0.5);
        for triangle in &mesh.triangles {
            assert_eq!(triangle.reference, BOUNDARY_TAG);
            let [a, b, c] = triangle.vertices.map(|v| mesh.vertex(v).unwrap().point());

            // Each triangle lies in one cube face plane...
            let on_face = (0..3).any(|axis| {
                a[axis] == b[axis] && b[axis] == c[axis] && (a[axis] == 0.0 || a[axis] == 1.0)
            });
            assert!(on_face, "{triangle:?} is not on the cube boundary");

            // ...and is oriented away from the cube centre.
            let normal = (b - a).cross(&(c - a));
            assert!(normal.dot(&(a - center)) > 0.0, "{triangle:?} points inward");
        }
    }

    #[test]
    fn test_two_tets_with_different_tags() {
        let mut mesh = TetMesh::from_tables(
            vertices(5),
            vec![
                Tetrahedron::new([1, 2, 3, 4], 1),
                Tetrahedron::new([2, 3, 4, 5], 2),
            ],
        );
        let report = extract_boundary(&mut mesh, &NeighbourSettings::with_workers(2)).unwrap();
        assert_eq!(report.boundary, 6);
        assert_eq!(report.interfaces, 1);
        assert_eq!(report.cross_links, 2);

        let interface: Vec<&Triangle> = mesh
            .triangles
            .iter()
            .filter(|t| t.reference == INTERFACE_TAG)
            .collect();
        assert_eq!(interface.len(), 1);
        // Emitted by tet 2 through its face 3, opposite vertex 5.
        assert_eq!(interface[0].vertices, mesh.tet(TetId::new(2).unwrap()).face(3));
    }

    #[test]
    fn test_extract_appends_to_existing_triangles() {
        let mut mesh = TetMesh::from_tables(vertices(4), vec![Tetrahedron::new([1, 2, 3, 4], 0)]);
        mesh.triangles.push(Triangle::new([1, 2, 3], 42));
        extract_boundary(&mut mesh, &NeighbourSettings::default()).unwrap();
        assert_eq!(mesh.num_triangles(), 5);
        assert_eq!(mesh.triangles[0].reference, 42);
    }

    #[test]
    fn test_no_tets_is_a_no_op() {
        let mut mesh = TetMesh::from_tables(vertices(3), Vec::new());
        let report = extract_boundary(&mut mesh, &NeighbourSettings::with_workers(4)).unwrap();
        assert_eq!(report.tetrahedra, 0);
        assert_eq!(report.boundary, 0);
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn test_invalid_mesh_is_rejected() {
        let mesh = TetMesh::from_tables(vertices(3), vec![Tetrahedron::new([1, 2, 3, 4], 0)]);
        let err = compute_neighbours(&mesh, &NeighbourSettings::with_workers(1)).unwrap_err();
        assert!(matches!(
            err,
            NeighbourError::Mesh(MeshError::VertexOutOfRange { tet: 1, vertex: 4, .. })
        ));
    }

    #[test]
    fn test_non_manifold_face_in_one_block_is_rejected() {
        let mesh = TetMesh::from_tables(
            vertices(6),
            vec![
                Tetrahedron::new([1, 2, 3, 4], 0),
                Tetrahedron::new([5, 2, 3, 4], 0),
                Tetrahedron::new([6, 2, 3, 4], 0),
            ],
        );
        let err = compute_neighbours(&mesh, &NeighbourSettings::with_workers(1)).unwrap_err();
        assert!(matches!(err, NeighbourError::NonManifoldFace { tet: 3, .. }));
    }

    #[test]
    fn test_settings_resolve_workers() {
        assert_eq!(NeighbourSettings::with_workers(3).resolved_workers(), 3);
        assert_eq!(NeighbourSettings::with_workers(1000).resolved_workers(), MAX_WORKERS);
        assert!(NeighbourSettings::default().resolved_workers() >= 1);
    }
}

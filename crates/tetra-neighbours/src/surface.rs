//! Boundary and material-interface triangle extraction.

use serde::{Deserialize, Serialize};
use tetra_mesh::{TetId, TetMesh, Triangle};

use crate::adjacency::Adjacency;
use crate::error::{NeighbourError, Result};

/// Tag of a triangle with no tetrahedron behind it.
pub const BOUNDARY_TAG: i32 = 0;

/// Tag of a triangle separating two regions with different tags.
pub const INTERFACE_TAG: i32 = 1;

/// Extracted surface triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Triangles in tetrahedron-then-face order.
    pub triangles: Vec<Triangle>,
    /// Number of triangles tagged [`BOUNDARY_TAG`].
    pub boundary: usize,
    /// Number of triangles tagged [`INTERFACE_TAG`].
    pub interfaces: usize,
}

/// Tag of the triangle emitted for a face of `id` backed by `neighbour`, if any.
///
/// A shared face between two regions is emitted from the higher-indexed
/// side only.
fn emitted_tag(mesh: &TetMesh, id: TetId, neighbour: Option<TetId>) -> Option<i32> {
    match neighbour {
        None => Some(BOUNDARY_TAG),
        Some(other) if id > other && mesh.tet(id).reference != mesh.tet(other).reference => {
            Some(INTERFACE_TAG)
        }
        Some(_) => None,
    }
}

/// Collect the boundary and interface triangles of `mesh`.
///
/// Counts the triangles first so the output is allocated once at its exact
/// size, then fills it in a second identical pass.
pub fn extract_surface(mesh: &TetMesh, adjacency: &Adjacency) -> Result<Surface> {
    if adjacency.len() != mesh.num_tetrahedra() {
        return Err(NeighbourError::AdjacencyMismatch {
            adjacency: adjacency.len(),
            tetrahedra: mesh.num_tetrahedra(),
        });
    }

    let mut boundary = 0;
    let mut interfaces = 0;
    for (id, slots) in adjacency.iter() {
        for &neighbour in slots {
            match emitted_tag(mesh, id, neighbour) {
                Some(BOUNDARY_TAG) => boundary += 1,
                Some(_) => interfaces += 1,
                None => {}
            }
        }
    }

    let count = boundary + interfaces;
    let mut triangles = Vec::new();
    triangles
        .try_reserve_exact(count)
        .map_err(|_| NeighbourError::Allocation {
            what: "triangle table",
            count,
        })?;

    for (id, slots) in adjacency.iter() {
        let tet = mesh.tet(id);
        for (face, &neighbour) in slots.iter().enumerate() {
            if let Some(tag) = emitted_tag(mesh, id, neighbour) {
                triangles.push(Triangle::new(tet.face(face), tag));
            }
        }
    }
    debug_assert_eq!(triangles.len(), count);

    Ok(Surface {
        triangles,
        boundary,
        interfaces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tetra_mesh::{Tetrahedron, Vertex};

    fn two_tets(tags: [i32; 2]) -> TetMesh {
        TetMesh::from_tables(
            vec![
                Vertex::new([0.0, 0.0, 0.0], 0),
                Vertex::new([1.0, 0.0, 0.0], 0),
                Vertex::new([0.0, 1.0, 0.0], 0),
                Vertex::new([0.0, 0.0, 1.0], 0),
                Vertex::new([1.0, 1.0, 1.0], 0),
            ],
            vec![
                Tetrahedron::new([1, 2, 3, 4], tags[0]),
                Tetrahedron::new([5, 2, 4, 3], tags[1]),
            ],
        )
    }

    fn linked(mesh: &TetMesh) -> Adjacency {
        let mut adjacency = Adjacency::allocate(mesh.num_tetrahedra()).unwrap();
        let blocks = crate::partition::partition(mesh.num_tetrahedra(), 1);
        let mut views = adjacency.split_blocks(&blocks);
        crate::local::link_local_faces(mesh, &mut views[0]).unwrap();
        drop(views);
        adjacency
    }

    #[test]
    fn test_uniform_tags_hide_shared_face() {
        let mesh = two_tets([4, 4]);
        let surface = extract_surface(&mesh, &linked(&mesh)).unwrap();
        assert_eq!(surface.triangles.len(), 6);
        assert_eq!(surface.boundary, 6);
        assert_eq!(surface.interfaces, 0);
    }

    #[test]
    fn test_interface_emitted_once_from_higher_index() {
        let mesh = two_tets([1, 2]);
        let surface = extract_surface(&mesh, &linked(&mesh)).unwrap();
        assert_eq!(surface.triangles.len(), 7);
        assert_eq!(surface.interfaces, 1);

        // Three boundary faces of tet 1, then face 0 of tet 2.
        assert_eq!(surface.triangles[3], Triangle::new([2, 4, 3], INTERFACE_TAG));
        let tagged = surface
            .triangles
            .iter()
            .filter(|t| t.reference == INTERFACE_TAG)
            .count();
        assert_eq!(tagged, 1);
    }

    #[test]
    fn test_unlinked_tet_emits_all_faces() {
        let mesh = two_tets([1, 1]);
        let adjacency = Adjacency::allocate(2).unwrap();
        let surface = extract_surface(&mesh, &adjacency).unwrap();
        assert_eq!(surface.boundary, 8);
        assert_eq!(surface.triangles[0], Triangle::new([2, 3, 4], BOUNDARY_TAG));
        assert_eq!(surface.triangles[1], Triangle::new([3, 1, 4], BOUNDARY_TAG));
        assert_eq!(surface.triangles[2], Triangle::new([4, 1, 2], BOUNDARY_TAG));
        assert_eq!(surface.triangles[3], Triangle::new([1, 3, 2], BOUNDARY_TAG));
    }

    #[test]
    fn test_mismatched_adjacency_is_rejected() {
        let mesh = two_tets([1, 1]);
        let adjacency = Adjacency::allocate(3).unwrap();
        assert!(matches!(
            extract_surface(&mesh, &adjacency),
            Err(NeighbourError::AdjacencyMismatch {
                adjacency: 3,
                tetrahedra: 2
            })
        ));
    }
}

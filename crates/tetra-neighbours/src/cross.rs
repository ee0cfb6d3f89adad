//! Phase 2: neighbours across block boundaries.

use tetra_mesh::TetMesh;

use crate::adjacency::BlockSlots;
use crate::error::{NeighbourError, Result};
use crate::table::FaceTable;

/// Resolve the faces Phase 1 left open by probing every other block's table.
///
/// Tables are probed in ascending worker order, skipping the view's own
/// (already exhausted in Phase 1); the first match wins. Only slots of the
/// view's block are written: the tetrahedron on the other side links back
/// when its own worker runs this pass. Returns the number of links made.
pub(crate) fn link_cross_faces(
    mesh: &TetMesh,
    tables: &[FaceTable],
    view: &mut BlockSlots<'_>,
) -> Result<usize> {
    let own = view.block.worker;
    let mut links = 0;

    for id in view.block.ids() {
        if view.degree(id) == 4 {
            continue;
        }
        let tet = mesh.tet(id);

        for face in 0..4 {
            if view.neighbour(id, face).is_some() {
                continue;
            }
            let key = tet.face_key(face);
            let found = tables
                .iter()
                .enumerate()
                .filter(|&(worker, _)| worker != own)
                .find_map(|(_, table)| table.find(key));

            if let Some(found) = found {
                if found.paired {
                    return Err(NeighbourError::NonManifoldFace {
                        tet: id.get(),
                        vertices: key.vertices(),
                    });
                }
                view.link(id, face, found.tet);
                links += 1;
            }
        }
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::Adjacency;
    use crate::local::link_local_faces;
    use crate::partition::partition;
    use tetra_mesh::{TetId, Tetrahedron, Vertex};

    fn id(i: u32) -> TetId {
        TetId::new(i).unwrap()
    }

    fn mesh(tets: Vec<Tetrahedron>) -> TetMesh {
        let vertices = (0..8).map(|i| Vertex::new([i as f64, 0.0, 0.0], 0)).collect();
        TetMesh::from_tables(vertices, tets)
    }

    /// Run both phases sequentially, one block at a time.
    fn run(mesh: &TetMesh, workers: usize) -> Result<(Adjacency, usize)> {
        let mut adjacency = Adjacency::allocate(mesh.num_tetrahedra())?;
        let blocks = partition(mesh.num_tetrahedra(), workers);
        let mut views = adjacency.split_blocks(&blocks);
        let tables = views
            .iter_mut()
            .map(|view| link_local_faces(mesh, view))
            .collect::<Result<Vec<_>>>()?;
        let mut links = 0;
        for view in views.iter_mut() {
            links += link_cross_faces(mesh, &tables, view)?;
        }
        drop(views);
        Ok((adjacency, links))
    }

    #[test]
    fn test_both_sides_link_back() {
        let mesh = mesh(vec![
            Tetrahedron::new([1, 2, 3, 4], 1),
            Tetrahedron::new([5, 2, 3, 4], 1),
        ]);
        let (adjacency, links) = run(&mesh, 2).unwrap();
        assert_eq!(links, 2);
        assert_eq!(adjacency.neighbour(id(1), 0), Some(id(2)));
        assert_eq!(adjacency.neighbour(id(2), 0), Some(id(1)));
        assert_eq!(adjacency.degree(id(1)), 1);
    }

    #[test]
    fn test_chain_across_three_blocks() {
        let mesh = mesh(vec![
            Tetrahedron::new([1, 2, 3, 4], 1),
            Tetrahedron::new([2, 3, 4, 5], 1),
            Tetrahedron::new([3, 4, 5, 6], 1),
        ]);
        let (adjacency, links) = run(&mesh, 3).unwrap();
        assert_eq!(links, 4);
        assert_eq!(adjacency.neighbours(id(1)), &[Some(id(2)), None, None, None]);
        assert_eq!(adjacency.neighbours(id(2)), &[Some(id(3)), None, None, Some(id(1))]);
        assert_eq!(adjacency.neighbours(id(3)), &[None, None, None, Some(id(2))]);
    }

    #[test]
    fn test_third_owner_in_foreign_block_is_rejected() {
        let mesh = mesh(vec![
            Tetrahedron::new([1, 2, 3, 4], 1),
            Tetrahedron::new([5, 2, 3, 4], 1),
            Tetrahedron::new([6, 2, 3, 4], 1),
        ]);
        // Tets 1 and 2 pair inside block 0; tet 3 finds the paired face.
        let err = run(&mesh, 2).unwrap_err();
        assert!(matches!(
            err,
            NeighbourError::NonManifoldFace {
                tet: 3,
                vertices: [2, 3, 4]
            }
        ));
    }
}

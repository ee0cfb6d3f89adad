//! Phase 1: neighbours between tetrahedra of the same block.

use tetra_mesh::TetMesh;

use crate::adjacency::BlockSlots;
use crate::error::Result;
use crate::table::{FaceTable, Insertion};

/// Hash every face of the block and link the pairs found inside it.
///
/// Each face is matched against the faces inserted before it, so a face
/// shared by two tetrahedra of the block is linked whichever of them comes
/// first. Faces left unmatched stay in the returned table for Phase 2.
pub(crate) fn link_local_faces(mesh: &TetMesh, view: &mut BlockSlots<'_>) -> Result<FaceTable> {
    let mut table = FaceTable::for_block(&view.block)?;

    for id in view.block.ids() {
        let tet = mesh.tet(id);
        for face in 0..4 {
            if let Insertion::Matched(found) = table.insert(tet.face_key(face), id, face)? {
                view.link(id, face, found.tet);
                view.link(found.tet, found.face, id);
            }
        }
    }

    Ok(table)
}

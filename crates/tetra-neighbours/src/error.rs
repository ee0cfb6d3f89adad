//! Error types for the neighbour computation.

use tetra_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur while computing neighbours or extracting the surface.
#[derive(Error, Debug)]
pub enum NeighbourError {
    /// The input mesh breaks a table invariant.
    #[error("invalid mesh: {0}")]
    Mesh(#[from] MeshError),

    /// The worker pool could not be started.
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A table sized by element count could not be allocated.
    #[error("cannot allocate {what} ({count} entries)")]
    Allocation {
        /// What was being allocated.
        what: &'static str,
        /// Number of entries requested.
        count: usize,
    },

    /// A face is owned by more than two tetrahedra.
    #[error("face ({}, {}, {}) of tetrahedron {tet} is shared by more than two tetrahedra", .vertices[0], .vertices[1], .vertices[2])]
    NonManifoldFace {
        /// 1-based index of the tetrahedron that found the third owner.
        tet: u32,
        /// Sorted vertex indices of the face.
        vertices: [u32; 3],
    },

    /// The adjacency table was computed for a different mesh.
    #[error("adjacency covers {adjacency} tetrahedra, mesh has {tetrahedra}")]
    AdjacencyMismatch {
        /// Tetrahedra covered by the adjacency table.
        adjacency: usize,
        /// Tetrahedra in the mesh.
        tetrahedra: usize,
    },
}

/// Result type for neighbour operations.
pub type Result<T> = std::result::Result<T, NeighbourError>;

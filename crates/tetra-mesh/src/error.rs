//! Error types for mesh validation.

use thiserror::Error;

/// Errors raised when a mesh does not satisfy the table invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The vertex table is empty.
    #[error("mesh has no vertices")]
    NoVertices,

    /// A tetrahedron references a vertex outside `1..=count`.
    #[error("tetrahedron {tet} references vertex {vertex}, mesh has {count} vertices")]
    VertexOutOfRange {
        /// 1-based tetrahedron index.
        tet: u32,
        /// Offending vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// A tetrahedron uses the same vertex twice.
    #[error("tetrahedron {tet} repeats vertex {vertex}")]
    RepeatedVertex {
        /// 1-based tetrahedron index.
        tet: u32,
        /// Repeated vertex index.
        vertex: u32,
    },

    /// An element table is too large for 32-bit 1-based indices.
    #[error("{kind} table holds {count} elements, more than 32-bit indices allow")]
    TooManyElements {
        /// Element kind ("vertices", "tetrahedra", ...).
        kind: &'static str,
        /// Number of elements.
        count: usize,
    },
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;

//! Error types for GMF mesh files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing a mesh file.
#[derive(Error, Debug)]
pub enum MeshIoError {
    /// The input file could not be opened or read.
    #[error("cannot open mesh {}: {source}", path.display())]
    Open {
        /// Path of the mesh.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be created or written.
    #[error("cannot create mesh {}: {source}", path.display())]
    Create {
        /// Path of the mesh.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while writing to a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The path has neither a `.mesh` nor a `.meshb` extension.
    #[error("unknown mesh format for {} (expected .mesh or .meshb)", .0.display())]
    UnknownFormat(PathBuf),

    /// The file content does not follow the format.
    #[error("malformed mesh at byte {offset}: {message}")]
    Format {
        /// Byte offset where the problem was detected.
        offset: usize,
        /// Error message.
        message: String,
    },

    /// Format version outside 1..=4.
    #[error("unsupported mesh version {0}")]
    UnsupportedVersion(i64),

    /// The mesh is not three-dimensional.
    #[error("can only handle 3D meshes, got dimension {0}")]
    UnsupportedDimension(i64),

    /// The mesh has no vertices.
    #[error("mesh has no vertices")]
    NoVertices,
}

impl MeshIoError {
    /// Create a format error.
    pub fn format(offset: usize, message: impl Into<String>) -> Self {
        Self::Format {
            offset,
            message: message.into(),
        }
    }
}

/// Result type for mesh file operations.
pub type Result<T> = std::result::Result<T, MeshIoError>;

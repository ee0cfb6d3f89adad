#![warn(missing_docs)]

//! GMF mesh file import/export for tetrahedral meshes.
//!
//! Reads and writes the vertex, triangle and tetrahedron tables of `.mesh`
//! (ASCII) and `.meshb` (binary) files, format versions 1 to 4. Every other
//! keyword is skipped on read.
//!
//! # Example
//!
//! ```no_run
//! use tetra_meshb::{read_mesh, write_mesh};
//!
//! let mut mesh = read_mesh("volume.meshb").unwrap();
//! mesh.triangles.clear();
//! write_mesh(&mesh, "volume.mesh").unwrap();
//! ```

mod ascii;
mod binary;
mod error;
mod format;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tetra_mesh::TetMesh;
use tracing::debug;

pub use error::{MeshIoError, Result};

/// Extension appended to output names that do not name a mesh file.
pub const DEFAULT_EXTENSION: &str = ".meshb";

/// Encoding of a mesh file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Text `.mesh` file.
    Ascii,
    /// Binary `.meshb` file.
    Binary,
}

impl MeshFormat {
    /// Format named by `path`: binary when it contains `.meshb`, otherwise
    /// ASCII when it contains `.mesh`.
    ///
    /// Every name kept or produced by [`with_default_extension`] is accepted.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        if name.contains(".meshb") {
            Ok(Self::Binary)
        } else if name.contains(".mesh") {
            Ok(Self::Ascii)
        } else {
            Err(MeshIoError::UnknownFormat(path.to_path_buf()))
        }
    }
}

/// Append [`DEFAULT_EXTENSION`] to `name` unless it already contains `.mesh`.
pub fn with_default_extension(name: &str) -> PathBuf {
    if name.contains(".mesh") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}{DEFAULT_EXTENSION}"))
    }
}

/// Decode a mesh held in memory.
pub fn read_mesh_from_buffer(data: &[u8], format: MeshFormat) -> Result<TetMesh> {
    match format {
        MeshFormat::Ascii => ascii::decode(data),
        MeshFormat::Binary => binary::decode(data),
    }
}

/// Read a mesh file, choosing the encoding from its name.
pub fn read_mesh(path: impl AsRef<Path>) -> Result<TetMesh> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path)?;
    let data = std::fs::read(path).map_err(|source| MeshIoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = read_mesh_from_buffer(&data, format)?;
    debug!(
        path = %path.display(),
        version = mesh.version,
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        tetrahedra = mesh.num_tetrahedra(),
        "read mesh"
    );
    Ok(mesh)
}

/// Encode a mesh into memory.
pub fn write_mesh_to_buffer(mesh: &TetMesh, format: MeshFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        MeshFormat::Ascii => ascii::encode(mesh, &mut buffer)?,
        MeshFormat::Binary => binary::encode(mesh, &mut buffer)?,
    }
    Ok(buffer)
}

/// Write a mesh file with the mesh's format version, choosing the encoding
/// from the name of `path`.
pub fn write_mesh(mesh: &TetMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path)?;
    let file = File::create(path).map_err(|source| MeshIoError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let out = BufWriter::new(file);
    match format {
        MeshFormat::Ascii => ascii::encode(mesh, out)?,
        MeshFormat::Binary => binary::encode(mesh, out)?,
    }
    debug!(
        path = %path.display(),
        version = mesh.version,
        triangles = mesh.num_triangles(),
        "wrote mesh"
    );
    Ok(())
}

//! Keywords and version-dependent word sizes shared by both encodings.

use crate::error::{MeshIoError, Result};

/// Keyword codes (binary) and names (ASCII) understood by the reader.
pub(crate) mod keyword {
    pub const VERSION: &str = "MeshVersionFormatted";

    pub const DIMENSION: i32 = 3;
    pub const VERTICES: i32 = 4;
    pub const TRIANGLES: i32 = 6;
    pub const TETRAHEDRA: i32 = 8;
    pub const END: i32 = 54;

    /// ASCII name of a keyword code.
    pub fn name(code: i32) -> &'static str {
        match code {
            DIMENSION => "Dimension",
            VERTICES => "Vertices",
            TRIANGLES => "Triangles",
            TETRAHEDRA => "Tetrahedra",
            END => "End",
            _ => "",
        }
    }

    /// Keyword code of an ASCII name.
    pub fn code(name: &str) -> Option<i32> {
        [DIMENSION, VERTICES, TRIANGLES, TETRAHEDRA, END]
            .into_iter()
            .find(|&code| self::name(code) == name)
    }
}

/// Word sizes of a GMF format version.
///
/// | version | reals | integers | offsets | counts |
/// |---------|-------|----------|---------|--------|
/// | 1       | f32   | 32-bit   | 32-bit  | 32-bit |
/// | 2       | f64   | 32-bit   | 32-bit  | 32-bit |
/// | 3       | f64   | 32-bit   | 64-bit  | 32-bit |
/// | 4       | f64   | 64-bit   | 64-bit  | 64-bit |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub version: i32,
}

impl Layout {
    pub fn new(version: i64) -> Result<Self> {
        match version {
            1..=4 => Ok(Self {
                version: version as i32,
            }),
            _ => Err(MeshIoError::UnsupportedVersion(version)),
        }
    }

    pub fn real_bytes(self) -> usize {
        if self.version == 1 {
            4
        } else {
            8
        }
    }

    pub fn int_bytes(self) -> usize {
        if self.version >= 4 {
            8
        } else {
            4
        }
    }

    pub fn offset_bytes(self) -> usize {
        if self.version >= 3 {
            8
        } else {
            4
        }
    }

    pub fn count_bytes(self) -> usize {
        if self.version >= 4 {
            8
        } else {
            4
        }
    }

    /// Bytes of one vertex record (coordinates then reference).
    pub fn vertex_bytes(self) -> usize {
        3 * self.real_bytes() + self.int_bytes()
    }

    /// Bytes of one element record with `nodes` vertex indices and a reference.
    pub fn element_bytes(self, nodes: usize) -> usize {
        (nodes + 1) * self.int_bytes()
    }
}

/// Convert a file integer to a 1-based vertex index.
pub(crate) fn vertex_index(value: i64, offset: usize) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| MeshIoError::format(offset, format!("invalid vertex index {value}")))
}

/// Convert a file integer to a reference tag.
pub(crate) fn reference(value: i64, offset: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| MeshIoError::format(offset, format!("reference {value} out of range")))
}

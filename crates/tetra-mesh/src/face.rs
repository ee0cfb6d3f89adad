//! Tetrahedron faces and the keys used to match them.
//!
//! Local face `j` is the triangle opposite local vertex `j`. Two tetrahedra
//! share a face exactly when the sorted vertex triples of their faces are
//! equal, whatever the local numbering on either side.

use serde::{Deserialize, Serialize};

/// Local vertex positions of each face, outward for a positively oriented
/// tetrahedron (`det(v1 - v0, v2 - v0, v3 - v0) > 0`).
pub const FACE_VERTICES: [[usize; 3]; 4] = [[1, 2, 3], [2, 0, 3], [3, 0, 1], [0, 2, 1]];

/// Hash weights applied to `(min, mid, max)`.
const KEY_WEIGHTS: [u64; 3] = [31, 7, 3];

/// Order-independent identity of a triangular face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceKey {
    /// Smallest vertex index.
    pub min: u32,
    /// Middle vertex index.
    pub mid: u32,
    /// Largest vertex index.
    pub max: u32,
}

impl FaceKey {
    /// Build the key of a face from its three vertex indices in any order.
    pub fn new(vertices: [u32; 3]) -> Self {
        let [a, b, c] = vertices;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (min, mid, max) = if c < lo {
            (c, lo, hi)
        } else if c > hi {
            (lo, hi, c)
        } else {
            (lo, c, hi)
        };
        Self { min, mid, max }
    }

    /// Bucket of this key in a power-of-two table, `mask` being `size - 1`.
    pub fn bucket(&self, mask: usize) -> usize {
        let hash = KEY_WEIGHTS[0]
            .wrapping_mul(self.min as u64)
            .wrapping_add(KEY_WEIGHTS[1].wrapping_mul(self.mid as u64))
            .wrapping_add(KEY_WEIGHTS[2].wrapping_mul(self.max as u64));
        (hash & mask as u64) as usize
    }

    /// The three vertex indices in ascending order.
    pub fn vertices(&self) -> [u32; 3] {
        [self.min, self.mid, self.max]
    }
}

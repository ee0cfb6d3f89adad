#![warn(missing_docs)]

//! Tetrahedral mesh tables for the tetra workspace.
//!
//! A [`TetMesh`] stores flat vertex, triangle and tetrahedron tables. Elements
//! are addressed with dense 1-based indices, as in the GMF mesh files the
//! tables are loaded from: vertex `1` is `vertices[0]`, tetrahedron
//! [`TetId`] `1` is `tetrahedra[0]`.

mod error;
mod face;
mod generate;

pub use error::{MeshError, Result};
pub use face::{FaceKey, FACE_VERTICES};
pub use generate::kuhn_box;

use std::fmt;
use std::num::NonZeroU32;

use nalgebra::{Matrix3, Point3};
use serde::{Deserialize, Serialize};

/// GMF version written when a mesh is created from scratch (double precision reals).
pub const DEFAULT_VERSION: i32 = 2;

/// 1-based index of a tetrahedron.
///
/// `Option<TetId>` is the same size as a `u32`, with `None` standing for the
/// index `0` ("no tetrahedron").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TetId(NonZeroU32);

impl TetId {
    /// Wrap a 1-based index; `0` yields `None`.
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// The 1-based index.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Position of the tetrahedron in the 0-based table.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for TetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Coordinates.
    pub position: [f64; 3],
    /// Reference tag.
    pub reference: i32,
}

impl Vertex {
    /// Create a vertex.
    pub fn new(position: [f64; 3], reference: i32) -> Self {
        Self {
            position,
            reference,
        }
    }

    /// Position as a nalgebra point.
    pub fn point(&self) -> Point3<f64> {
        Point3::from(self.position)
    }
}

/// A triangle, either read from a file or extracted from the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    /// 1-based vertex indices.
    pub vertices: [u32; 3],
    /// Reference tag.
    pub reference: i32,
}

impl Triangle {
    /// Create a triangle.
    pub fn new(vertices: [u32; 3], reference: i32) -> Self {
        Self {
            vertices,
            reference,
        }
    }
}

/// A tetrahedron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tetrahedron {
    /// 1-based vertex indices.
    pub vertices: [u32; 4],
    /// Region reference tag.
    pub reference: i32,
}

impl Tetrahedron {
    /// Create a tetrahedron.
    pub fn new(vertices: [u32; 4], reference: i32) -> Self {
        Self {
            vertices,
            reference,
        }
    }

    /// Vertex indices of local face `face`, in outward order.
    ///
    /// # Panics
    ///
    /// Panics if `face > 3`.
    pub fn face(&self, face: usize) -> [u32; 3] {
        let [a, b, c] = FACE_VERTICES[face];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Matching key of local face `face`.
    pub fn face_key(&self, face: usize) -> FaceKey {
        FaceKey::new(self.face(face))
    }
}

/// Flat tables of a tetrahedral volume mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetMesh {
    /// GMF format version the mesh was read with (or will be written with).
    pub version: i32,
    /// Vertex table, vertex `i` stored at `vertices[i - 1]`.
    pub vertices: Vec<Vertex>,
    /// Triangle table.
    pub triangles: Vec<Triangle>,
    /// Tetrahedron table, [`TetId`] `i` stored at `tetrahedra[i - 1]`.
    pub tetrahedra: Vec<Tetrahedron>,
}

impl TetMesh {
    /// Create an empty mesh with the given format version.
    pub fn new(version: i32) -> Self {
        Self {
            version,
            vertices: Vec::new(),
            triangles: Vec::new(),
            tetrahedra: Vec::new(),
        }
    }

    /// Build a mesh from vertex and tetrahedron tables.
    pub fn from_tables(vertices: Vec<Vertex>, tetrahedra: Vec<Tetrahedron>) -> Self {
        Self {
            version: DEFAULT_VERSION,
            vertices,
            triangles: Vec::new(),
            tetrahedra,
        }
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of tetrahedra.
    pub fn num_tetrahedra(&self) -> usize {
        self.tetrahedra.len()
    }

    /// Tetrahedron `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is past the end of the table.
    pub fn tet(&self, id: TetId) -> &Tetrahedron {
        &self.tetrahedra[id.index()]
    }

    /// Vertex with 1-based index `index`, if it exists.
    pub fn vertex(&self, index: u32) -> Option<&Vertex> {
        index
            .checked_sub(1)
            .and_then(|i| self.vertices.get(i as usize))
    }

    /// Ids of all tetrahedra in table order.
    pub fn tet_ids(&self) -> impl Iterator<Item = TetId> + '_ {
        (1..=self.tetrahedra.len() as u32).filter_map(TetId::new)
    }

    /// Signed volume of tetrahedron `id`, positive when its faces follow
    /// [`FACE_VERTICES`] outward.
    ///
    /// Returns `None` if a vertex index is out of range.
    pub fn signed_volume(&self, id: TetId) -> Option<f64> {
        let tet = self.tet(id);
        let mut points = [Point3::origin(); 4];
        for (point, &v) in points.iter_mut().zip(&tet.vertices) {
            *point = self.vertex(v)?.point();
        }
        let m = Matrix3::from_columns(&[
            points[1] - points[0],
            points[2] - points[0],
            points[3] - points[0],
        ]);
        Some(m.determinant() / 6.0)
    }

    /// Check the table invariants the adjacency computation relies on.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() {
            return Err(MeshError::NoVertices);
        }
        if self.vertices.len() >= u32::MAX as usize {
            return Err(MeshError::TooManyElements {
                kind: "vertices",
                count: self.vertices.len(),
            });
        }
        if self.tetrahedra.len() >= u32::MAX as usize {
            return Err(MeshError::TooManyElements {
                kind: "tetrahedra",
                count: self.tetrahedra.len(),
            });
        }

        let count = self.vertices.len();
        for (id, tet) in self.tet_ids().zip(&self.tetrahedra) {
            if let Some(&vertex) = tet
                .vertices
                .iter()
                .find(|&&v| v == 0 || v as usize > count)
            {
                return Err(MeshError::VertexOutOfRange {
                    tet: id.get(),
                    vertex,
                    count,
                });
            }
            for (k, &vertex) in tet.vertices.iter().enumerate() {
                if tet.vertices[k + 1..].contains(&vertex) {
                    return Err(MeshError::RepeatedVertex {
                        tet: id.get(),
                        vertex,
                    });
                }
            }
        }
        Ok(())
    }

    /// Append triangles to the triangle table.
    pub fn append_triangles(&mut self, triangles: impl IntoIterator<Item = Triangle>) {
        self.triangles.extend(triangles);
    }
}

impl Default for TetMesh {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tet() -> TetMesh {
        TetMesh::from_tables(
            vec![
                Vertex::new([0.0, 0.0, 0.0], 0),
                Vertex::new([1.0, 0.0, 0.0], 0),
                Vertex::new([0.0, 1.0, 0.0], 0),
                Vertex::new([0.0, 0.0, 1.0], 0),
            ],
            vec![Tetrahedron::new([1, 2, 3, 4], 7)],
        )
    }

    #[test]
    fn test_tet_id_is_one_based() {
        assert!(TetId::new(0).is_none());
        let id = TetId::new(5).unwrap();
        assert_eq!(id.get(), 5);
        assert_eq!(id.index(), 4);
        assert_eq!(std::mem::size_of::<Option<TetId>>(), 4);
    }

    #[test]
    fn test_vertex_lookup() {
        let mesh = unit_tet();
        assert!(mesh.vertex(0).is_none());
        assert_eq!(mesh.vertex(2).unwrap().position, [1.0, 0.0, 0.0]);
        assert!(mesh.vertex(5).is_none());
    }

    #[test]
    fn test_signed_volume() {
        let mesh = unit_tet();
        let id = TetId::new(1).unwrap();
        assert_relative_eq!(mesh.signed_volume(id).unwrap(), 1.0 / 6.0);
    }

    #[test]
    fn test_faces_point_away_from_opposite_vertex() {
        let mesh = unit_tet();
        let tet = mesh.tet(TetId::new(1).unwrap());
        for face in 0..4 {
            let [a, b, c] = tet.face(face).map(|v| mesh.vertex(v).unwrap().point());
            let normal = (b - a).cross(&(c - a));
            let opposite = mesh.vertex(tet.vertices[face]).unwrap().point();
            assert!(normal.dot(&(a - opposite)) > 0.0, "face {face} points inward");
        }
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        assert_eq!(TetMesh::default().validate(), Err(MeshError::NoVertices));

        let mut mesh = unit_tet();
        assert!(mesh.validate().is_ok());
        mesh.tetrahedra.push(Tetrahedron::new([1, 2, 3, 9], 0));
        assert_eq!(
            mesh.validate(),
            Err(MeshError::VertexOutOfRange {
                tet: 2,
                vertex: 9,
                count: 4
            })
        );

        mesh.tetrahedra[1] = Tetrahedron::new([1, 2, 2, 3], 0);
        assert_eq!(
            mesh.validate(),
            Err(MeshError::RepeatedVertex { tet: 2, vertex: 2 })
        );
    }

    #[test]
    fn test_append_triangles() {
        let mut mesh = unit_tet();
        mesh.append_triangles([Triangle::new([1, 2, 3], 0)]);
        mesh.append_triangles(vec![Triangle::new([1, 3, 4], 1)]);
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.triangles[1].reference, 1);
    }
}

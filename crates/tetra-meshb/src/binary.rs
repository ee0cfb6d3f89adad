//! Binary GMF (`.meshb`) encoding.
//!
//! A file is the code word `1`, the version, the `Dimension` keyword, then a
//! sequence of keyword records. Each record carries the offset of the next
//! one, so unknown keywords are skipped without being decoded. Files are
//! written little-endian; big-endian files are detected from the code word.

use std::io::Write;

use tetra_mesh::{Tetrahedron, TetMesh, Triangle, Vertex};
use tracing::trace;

use crate::error::{MeshIoError, Result};
use crate::format::{keyword, reference, vertex_index, Layout};

/// Byte cursor over a binary mesh.
struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    big_endian: bool,
    layout: Layout,
}

impl Decoder<'_> {
    fn bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or_else(|| MeshIoError::format(self.pos, "unexpected end of file"))?;
        let mut word = [0u8; N];
        word.copy_from_slice(slice);
        self.pos += N;
        Ok(word)
    }

    fn i32(&mut self) -> Result<i32> {
        let word = self.bytes()?;
        Ok(if self.big_endian {
            i32::from_be_bytes(word)
        } else {
            i32::from_le_bytes(word)
        })
    }

    fn i64(&mut self) -> Result<i64> {
        let word = self.bytes()?;
        Ok(if self.big_endian {
            i64::from_be_bytes(word)
        } else {
            i64::from_le_bytes(word)
        })
    }

    fn real(&mut self) -> Result<f64> {
        if self.layout.real_bytes() == 4 {
            let word = self.bytes()?;
            Ok(f64::from(if self.big_endian {
                f32::from_be_bytes(word)
            } else {
                f32::from_le_bytes(word)
            }))
        } else {
            let word = self.bytes()?;
            Ok(if self.big_endian {
                f64::from_be_bytes(word)
            } else {
                f64::from_le_bytes(word)
            })
        }
    }

    fn int(&mut self) -> Result<i64> {
        if self.layout.int_bytes() == 4 {
            self.i32().map(i64::from)
        } else {
            self.i64()
        }
    }

    fn unsigned(&mut self, bytes: usize, what: &str) -> Result<usize> {
        let at = self.pos;
        let value = if bytes == 4 {
            i64::from(self.i32()?)
        } else {
            self.i64()?
        };
        usize::try_from(value).map_err(|_| MeshIoError::format(at, format!("negative {what}")))
    }

    fn offset(&mut self) -> Result<usize> {
        self.unsigned(self.layout.offset_bytes(), "keyword offset")
    }

    /// Read a record count and check the block fits in the file.
    fn count(&mut self, record_bytes: usize, name: &str) -> Result<usize> {
        let at = self.pos;
        let count = self.unsigned(self.layout.count_bytes(), "record count")?;
        let remaining = self.data.len() - self.pos;
        if count.checked_mul(record_bytes).map_or(true, |n| n > remaining) {
            return Err(MeshIoError::format(
                at,
                format!("{name} block of {count} records is truncated"),
            ));
        }
        Ok(count)
    }

    fn vertices(&mut self) -> Result<Vec<Vertex>> {
        let count = self.count(self.layout.vertex_bytes(), "Vertices")?;
        let mut vertices = Vec::with_capacity(count);
        for _ in 0..count {
            let position = [self.real()?, self.real()?, self.real()?];
            let at = self.pos;
            vertices.push(Vertex::new(position, reference(self.int()?, at)?));
        }
        Ok(vertices)
    }

    /// `N` vertex indices followed by a reference, per record.
    fn elements<const N: usize>(&mut self, name: &str) -> Result<Vec<([u32; N], i32)>> {
        let count = self.count(self.layout.element_bytes(N), name)?;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            let mut nodes = [0u32; N];
            for node in &mut nodes {
                let at = self.pos;
                *node = vertex_index(self.int()?, at)?;
            }
            let at = self.pos;
            elements.push((nodes, reference(self.int()?, at)?));
        }
        Ok(elements)
    }
}

/// Decode a binary mesh held in memory.
pub(crate) fn decode(data: &[u8]) -> Result<TetMesh> {
    let magic: [u8; 4] = data
        .get(..4)
        .and_then(|m| m.try_into().ok())
        .ok_or_else(|| MeshIoError::format(0, "file too short"))?;
    let big_endian = if i32::from_le_bytes(magic) == 1 {
        false
    } else if i32::from_be_bytes(magic) == 1 {
        true
    } else {
        return Err(MeshIoError::format(0, "not a binary GMF mesh"));
    };

    let mut decoder = Decoder {
        data,
        pos: 4,
        big_endian,
        layout: Layout { version: 1 },
    };
    let version = decoder.i32()?;
    decoder.layout = Layout::new(i64::from(version))?;

    let at = decoder.pos;
    if decoder.i32()? != keyword::DIMENSION {
        return Err(MeshIoError::format(at, "expected the Dimension keyword"));
    }
    decoder.offset()?;
    let dimension = decoder.i32()?;
    if dimension != 3 {
        return Err(MeshIoError::UnsupportedDimension(i64::from(dimension)));
    }

    let mut mesh = TetMesh::new(version);
    loop {
        let at = decoder.pos;
        if at == data.len() {
            break;
        }
        let code = decoder.i32()?;
        if code == keyword::END {
            break;
        }
        let next = decoder.offset()?;
        match code {
            keyword::VERTICES => mesh.vertices = decoder.vertices()?,
            keyword::TRIANGLES => {
                mesh.triangles = decoder
                    .elements::<3>("Triangles")?
                    .into_iter()
                    .map(|(nodes, reference)| Triangle::new(nodes, reference))
                    .collect();
            }
            keyword::TETRAHEDRA => {
                mesh.tetrahedra = decoder
                    .elements::<4>("Tetrahedra")?
                    .into_iter()
                    .map(|(nodes, reference)| Tetrahedron::new(nodes, reference))
                    .collect();
            }
            _ => trace!(code, offset = at, "skipping keyword"),
        }

        if next == 0 {
            break;
        }
        if next <= at || next > data.len() {
            return Err(MeshIoError::format(
                at,
                format!("keyword {code} points to invalid offset {next}"),
            ));
        }
        decoder.pos = next;
    }

    if mesh.vertices.is_empty() {
        return Err(MeshIoError::NoVertices);
    }
    Ok(mesh)
}

/// Word writer tracking its own byte offset.
pub(crate) struct Encoder<W: Write> {
    out: W,
    offset: u64,
    big_endian: bool,
    layout: Layout,
}

impl<W: Write> Encoder<W> {
    pub fn new(out: W, layout: Layout, big_endian: bool) -> Self {
        Self {
            out,
            offset: 0,
            big_endian,
            layout,
        }
    }

    fn put(&mut self, le: &[u8], be: &[u8]) -> Result<()> {
        self.out.write_all(if self.big_endian { be } else { le })?;
        self.offset += le.len() as u64;
        Ok(())
    }

    pub fn i32(&mut self, value: i32) -> Result<()> {
        self.put(&value.to_le_bytes(), &value.to_be_bytes())
    }

    pub fn i64(&mut self, value: i64) -> Result<()> {
        self.put(&value.to_le_bytes(), &value.to_be_bytes())
    }

    pub fn real(&mut self, value: f64) -> Result<()> {
        if self.layout.real_bytes() == 4 {
            let value = value as f32;
            self.put(&value.to_le_bytes(), &value.to_be_bytes())
        } else {
            self.put(&value.to_le_bytes(), &value.to_be_bytes())
        }
    }

    pub fn int(&mut self, value: i64) -> Result<()> {
        if self.layout.int_bytes() == 4 {
            let narrow = i32::try_from(value).map_err(|_| {
                MeshIoError::format(
                    self.offset as usize,
                    format!("{value} needs version 4 to be stored"),
                )
            })?;
            self.i32(narrow)
        } else {
            self.i64(value)
        }
    }

    fn sized(&mut self, value: u64, bytes: usize, what: &str) -> Result<()> {
        if bytes == 4 {
            let narrow = i32::try_from(value).map_err(|_| {
                MeshIoError::format(
                    self.offset as usize,
                    format!("{what} {value} does not fit version {}", self.layout.version),
                )
            })?;
            self.i32(narrow)
        } else {
            self.i64(value as i64)
        }
    }

    /// Write the offset of the next keyword, `0` for none.
    pub fn next_offset(&mut self, value: u64) -> Result<()> {
        self.sized(value, self.layout.offset_bytes(), "offset")
    }

    /// Write a keyword header for `count` records of `record_bytes` each.
    pub fn keyword(&mut self, code: i32, count: usize, record_bytes: usize) -> Result<()> {
        let layout = self.layout;
        let next = self.offset
            + 4
            + (layout.offset_bytes() + layout.count_bytes()) as u64
            + (count * record_bytes) as u64;
        self.i32(code)?;
        self.next_offset(next)?;
        self.sized(count as u64, layout.count_bytes(), "record count")
    }

    /// Write the code word, version and dimension.
    pub fn header(&mut self) -> Result<()> {
        self.i32(1)?;
        self.i32(self.layout.version)?;
        self.i32(keyword::DIMENSION)?;
        let next = self.offset + self.layout.offset_bytes() as u64 + 4;
        self.next_offset(next)?;
        self.i32(3)
    }

    pub fn end(&mut self) -> Result<()> {
        self.i32(keyword::END)?;
        self.next_offset(0)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Encode `mesh` in binary form.
pub(crate) fn encode<W: Write>(mesh: &TetMesh, out: W) -> Result<()> {
    let layout = Layout::new(i64::from(mesh.version))?;
    let mut encoder = Encoder::new(out, layout, false);
    encoder.header()?;

    if !mesh.vertices.is_empty() {
        encoder.keyword(keyword::VERTICES, mesh.vertices.len(), layout.vertex_bytes())?;
        for vertex in &mesh.vertices {
            for &x in &vertex.position {
                encoder.real(x)?;
            }
            encoder.int(i64::from(vertex.reference))?;
        }
    }

    if !mesh.triangles.is_empty() {
        encoder.keyword(
            keyword::TRIANGLES,
            mesh.triangles.len(),
            layout.element_bytes(3),
        )?;
        for triangle in &mesh.triangles {
            for &v in &triangle.vertices {
                encoder.int(i64::from(v))?;
            }
            encoder.int(i64::from(triangle.reference))?;
        }
    }

    if !mesh.tetrahedra.is_empty() {
        encoder.keyword(
            keyword::TETRAHEDRA,
            mesh.tetrahedra.len(),
            layout.element_bytes(4),
        )?;
        for tet in &mesh.tetrahedra {
            for &v in &tet.vertices {
                encoder.int(i64::from(v))?;
            }
            encoder.int(i64::from(tet.reference))?;
        }
    }

    encoder.end()
}

//! ASCII GMF (`.mesh`) encoding.
//!
//! The file is a whitespace-separated stream of words: keyword names,
//! record counts and record fields. `#` starts a comment running to the end
//! of the line. Keywords other than the ones below are skipped up to the
//! next word starting with a letter.

use std::io::Write;

use tetra_mesh::{Tetrahedron, TetMesh, Triangle, Vertex};
use tracing::trace;

use crate::error::{MeshIoError, Result};
use crate::format::{keyword, reference, vertex_index, Layout};

/// Word lexer for ASCII meshes.
struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn skip_blanks(&mut self) {
        while let Some(&c) = self.input.get(self.pos) {
            if c == b'#' {
                while self.input.get(self.pos).is_some_and(|&c| c != b'\n') {
                    self.pos += 1;
                }
            } else if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Offset and text of the next word, without consuming it.
    fn peek(&mut self) -> Option<(usize, &'a [u8])> {
        self.skip_blanks();
        let start = self.pos;
        let len = self.input[start..]
            .iter()
            .take_while(|c| !c.is_ascii_whitespace() && **c != b'#')
            .count();
        (len > 0).then(|| (start, &self.input[start..start + len]))
    }

    fn next_word(&mut self) -> Option<(usize, &'a [u8])> {
        let word = self.peek()?;
        self.pos = word.0 + word.1.len();
        Some(word)
    }

    fn expect_word(&mut self, what: &str) -> Result<(usize, &'a str)> {
        let (at, word) = self.next_word().ok_or_else(|| {
            MeshIoError::format(self.pos, format!("expected {what}, found end of file"))
        })?;
        let text = std::str::from_utf8(word).map_err(|_| {
            MeshIoError::format(at, format!("expected {what}, found invalid UTF-8"))
        })?;
        Ok((at, text))
    }

    fn int(&mut self) -> Result<(usize, i64)> {
        let (at, text) = self.expect_word("an integer")?;
        let value = text.parse().map_err(|_| {
            MeshIoError::format(at, format!("expected an integer, found '{text}'"))
        })?;
        Ok((at, value))
    }

    fn real(&mut self) -> Result<f64> {
        let (at, text) = self.expect_word("a real")?;
        text.parse()
            .map_err(|_| MeshIoError::format(at, format!("expected a real, found '{text}'")))
    }

    fn count(&mut self) -> Result<usize> {
        let (at, value) = self.int()?;
        usize::try_from(value)
            .map_err(|_| MeshIoError::format(at, format!("invalid record count {value}")))
    }

    fn reference(&mut self) -> Result<i32> {
        let (at, value) = self.int()?;
        reference(value, at)
    }

    fn nodes<const N: usize>(&mut self) -> Result<[u32; N]> {
        let mut nodes = [0u32; N];
        for node in &mut nodes {
            let (at, value) = self.int()?;
            *node = vertex_index(value, at)?;
        }
        Ok(nodes)
    }

    /// Skip the body of an unknown keyword.
    fn skip_keyword(&mut self) {
        while let Some((_, word)) = self.peek() {
            if word[0].is_ascii_alphabetic() {
                break;
            }
            self.next_word();
        }
    }
}

/// Decode an ASCII mesh held in memory.
pub(crate) fn decode(data: &[u8]) -> Result<TetMesh> {
    let mut lexer = Lexer::new(data);
    let mut version = None;
    let mut dimension = None;
    let mut mesh = TetMesh::default();

    while let Some((at, word)) = lexer.next_word() {
        let name = std::str::from_utf8(word).unwrap_or_default();
        if name == keyword::VERSION {
            let (_, value) = lexer.int()?;
            mesh.version = Layout::new(value)?.version;
            version = Some(mesh.version);
            continue;
        }

        let Some(code) = keyword::code(name) else {
            if word[0].is_ascii_alphabetic() {
                trace!(keyword = name, offset = at, "skipping keyword");
                lexer.skip_keyword();
                continue;
            }
            let found = String::from_utf8_lossy(word);
            return Err(MeshIoError::format(at, format!("unexpected '{found}'")));
        };
        if code == keyword::END {
            break;
        }
        if version.is_none() {
            let message = format!("{name} before {}", keyword::VERSION);
            return Err(MeshIoError::format(at, message));
        }
        if code == keyword::DIMENSION {
            let (_, value) = lexer.int()?;
            if value != 3 {
                return Err(MeshIoError::UnsupportedDimension(value));
            }
            dimension = Some(value);
            continue;
        }
        if dimension.is_none() {
            return Err(MeshIoError::format(at, format!("{name} before Dimension")));
        }

        let count = lexer.count()?;
        match code {
            keyword::VERTICES => {
                mesh.vertices = (0..count)
                    .map(|_| -> Result<Vertex> {
                        let position = [lexer.real()?, lexer.real()?, lexer.real()?];
                        Ok(Vertex::new(position, lexer.reference()?))
                    })
                    .collect::<Result<_>>()?;
            }
            keyword::TRIANGLES => {
                mesh.triangles = (0..count)
                    .map(|_| -> Result<Triangle> {
                        Ok(Triangle::new(lexer.nodes()?, lexer.reference()?))
                    })
                    .collect::<Result<_>>()?;
            }
            _ => {
                mesh.tetrahedra = (0..count)
                    .map(|_| -> Result<Tetrahedron> {
                        Ok(Tetrahedron::new(lexer.nodes()?, lexer.reference()?))
                    })
                    .collect::<Result<_>>()?;
            }
        }
    }

    if version.is_none() {
        return Err(MeshIoError::format(0, format!("missing {}", keyword::VERSION)));
    }
    if mesh.vertices.is_empty() {
        return Err(MeshIoError::NoVertices);
    }
    Ok(mesh)
}

/// Encode `mesh` in ASCII form.
pub(crate) fn encode<W: Write>(mesh: &TetMesh, mut out: W) -> Result<()> {
    let layout = Layout::new(i64::from(mesh.version))?;
    writeln!(out, "{} {}\n", keyword::VERSION, layout.version)?;
    writeln!(out, "{} 3\n", keyword::name(keyword::DIMENSION))?;

    if !mesh.vertices.is_empty() {
        writeln!(out, "{}\n{}", keyword::name(keyword::VERTICES), mesh.vertices.len())?;
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            if layout.real_bytes() == 4 {
                writeln!(out, "{} {} {} {}", x as f32, y as f32, z as f32, vertex.reference)?;
            } else {
                writeln!(out, "{x} {y} {z} {}", vertex.reference)?;
            }
        }
        writeln!(out)?;
    }

    if !mesh.triangles.is_empty() {
        writeln!(out, "{}\n{}", keyword::name(keyword::TRIANGLES), mesh.triangles.len())?;
        for triangle in &mesh.triangles {
            let [a, b, c] = triangle.vertices;
            writeln!(out, "{a} {b} {c} {}", triangle.reference)?;
        }
        writeln!(out)?;
    }

    if !mesh.tetrahedra.is_empty() {
        writeln!(out, "{}\n{}", keyword::name(keyword::TETRAHEDRA), mesh.tetrahedra.len())?;
        for tet in &mesh.tetrahedra {
            let [a, b, c, d] = tet.vertices;
            writeln!(out, "{a} {b} {c} {d} {}", tet.reference)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", keyword::name(keyword::END))?;
    out.flush()?;
    Ok(())
}

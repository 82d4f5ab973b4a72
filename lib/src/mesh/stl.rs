//! STL file loading.
//!
//! Supports both ASCII and binary STL. Only the command-line front end reads
//! files; the slicing core takes vertex slices.

use super::Mesh;
use crate::geometry::Point3F;
use crate::{Error, Result};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Size of one binary facet record: normal, three vertices, attribute count.
const BINARY_FACET_BYTES: u64 = 50;
const BINARY_HEADER_BYTES: u64 = 84;
/// Upper bound on triangles preallocated from an untrusted header count.
const MAX_PREALLOC_TRIANGLES: usize = 1 << 20;

/// Load a mesh from an STL file.
///
/// Automatically detects whether the file is ASCII or binary format.
pub fn load_stl<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let file_len = std::fs::metadata(path)?.len();
    let mut reader = BufReader::new(File::open(path)?);

    let mut header = [0u8; 80];
    let read = read_up_to(&mut reader, &mut header)?;

    // Some binary exporters also start with "solid"; the size check settles it
    let header_str = String::from_utf8_lossy(&header[..read]);
    let is_ascii = header_str.trim_start().starts_with("solid")
        && is_likely_ascii(&header[..read])
        && !binary_size_matches(&mut reader, file_len)?;

    let file = File::open(path)?;
    let mesh = if is_ascii {
        load_stl_ascii(BufReader::new(file))?
    } else {
        load_stl_binary(BufReader::new(file))?
    };
    debug!(
        "Loaded {} triangles from {} ({})",
        mesh.triangle_count(),
        path.display(),
        if is_ascii { "ascii" } else { "binary" }
    );
    Ok(mesh)
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// True when the declared binary facet count accounts for the file size exactly.
fn binary_size_matches<R: Read>(reader: &mut R, file_len: u64) -> Result<bool> {
    let mut count = [0u8; 4];
    if read_up_to(reader, &mut count)? < 4 {
        return Ok(false);
    }
    let facets = u32::from_le_bytes(count) as u64;
    Ok(BINARY_HEADER_BYTES + facets * BINARY_FACET_BYTES == file_len)
}

/// Binary STL files often have null bytes in the header.
fn is_likely_ascii(header: &[u8]) -> bool {
    !header
        .iter()
        .any(|&b| b == 0 || (b < 32 && b != b'\n' && b != b'\r' && b != b'\t'))
}

fn parse_coord(s: Option<&str>, axis: &str) -> Result<f64> {
    s.and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::Mesh(format!("Invalid vertex {} coordinate", axis)))
}

/// Load an ASCII STL stream.
pub fn load_stl_ascii<R: BufRead>(reader: R) -> Result<Mesh> {
    let mut vertices = Vec::new();
    let mut facet: Vec<Point3F> = Vec::with_capacity(3);

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("vertex") {
            let mut parts = rest.split_whitespace();
            let x = parse_coord(parts.next(), "X")?;
            let y = parse_coord(parts.next(), "Y")?;
            let z = parse_coord(parts.next(), "Z")?;
            facet.push(Point3F::new(x, y, z));
        } else if line.starts_with("endfacet") {
            if facet.len() == 3 {
                vertices.append(&mut facet);
            }
            facet.clear();
        }
    }

    if vertices.is_empty() {
        return Err(Error::Mesh("No triangles found in STL file".into()));
    }
    Mesh::from_vertices(vertices)
}

/// Load a binary STL stream.
pub fn load_stl_binary<R: Read>(mut reader: R) -> Result<Mesh> {
    let mut header = [0u8; 80];
    reader.read_exact(&mut header)?;

    let mut count_bytes = [0u8; 4];
    reader.read_exact(&mut count_bytes)?;
    let triangle_count = u32::from_le_bytes(count_bytes) as usize;

    let mut vertices = Vec::with_capacity(triangle_count.min(MAX_PREALLOC_TRIANGLES) * 3);
    let mut facet = [0u8; BINARY_FACET_BYTES as usize];
    for _ in 0..triangle_count {
        reader.read_exact(&mut facet)?;
        // Normal occupies bytes 0-11; attribute count 48-49
        vertices.push(read_vertex(&facet[12..24]));
        vertices.push(read_vertex(&facet[24..36]));
        vertices.push(read_vertex(&facet[36..48]));
    }

    if vertices.is_empty() {
        return Err(Error::Mesh("No triangles found in STL file".into()));
    }
    Mesh::from_vertices(vertices)
}

fn read_vertex(data: &[u8]) -> Point3F {
    let f = |i: usize| f32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]) as f64;
    Point3F::new(f(0), f(4), f(8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ASCII_TRIANGLE: &str = "solid test
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
endsolid test
";

    #[test]
    fn test_load_ascii() {
        let mesh = load_stl_ascii(Cursor::new(ASCII_TRIANGLE)).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices()[1], Point3F::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_load_ascii_bad_coordinate() {
        let bad = ASCII_TRIANGLE.replace("vertex 1 0 0", "vertex one 0 0");
        assert!(matches!(load_stl_ascii(Cursor::new(bad)), Err(Error::Mesh(_))));
    }

    #[test]
    fn test_load_binary() {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]);
        for v in [[0.0f32, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 1.5]] {
            for c in v {
                data.extend_from_slice(&c.to_le_bytes());
            }
        }
        data.extend_from_slice(&[0u8; 2]);

        let mesh = load_stl_binary(Cursor::new(data)).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices()[2], Point3F::new(0.0, 2.0, 1.5));
    }

    #[test]
    fn test_load_binary_truncated() {
        // Header claims far more facets than the stream holds
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&[0u8; 50]);
        assert!(matches!(load_stl_binary(Cursor::new(data)), Err(Error::Io(_))));
    }

    #[test]
    fn test_load_empty_ascii() {
        assert!(load_stl_ascii(Cursor::new("solid empty\nendsolid empty\n")).is_err());
    }
}

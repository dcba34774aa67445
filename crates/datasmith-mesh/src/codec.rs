//! Little-endian codec primitives for the binary mesh format.
//!
//! Every multi-byte field in the format is little-endian. Arrays and
//! strings are length-prefixed with a `u32` count; string lengths include
//! a single trailing NUL byte.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Vec2, Vec3};

use crate::error::{MeshError, Result};

/// A reader wrapper that tracks the current byte offset.
///
/// Decode errors report the offset they occurred at, so the whole decode
/// path reads through one of these.
pub struct TrackingReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> TrackingReader<R> {
    /// Wrap a reader, starting the offset count at zero.
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Byte offset of the next read.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<R: Read> Read for TrackingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

/// One fixed-size element of a length-prefixed wire array.
///
/// Multi-field wire tuples surface as the matching glam vector; a single
/// field stays a scalar.
pub trait Element: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Read one element.
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self>;

    /// Write one element.
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;
}

impl Element for u32 {
    const SIZE: usize = 4;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_u32::<LittleEndian>()
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(*self)
    }
}

impl Element for f32 {
    const SIZE: usize = 4;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_f32::<LittleEndian>()
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(*self)
    }
}

impl Element for Vec2 {
    const SIZE: usize = 8;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        Ok(Vec2::new(x, y))
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self.x)?;
        writer.write_f32::<LittleEndian>(self.y)
    }
}

impl Element for Vec3 {
    const SIZE: usize = 12;

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        let z = reader.read_f32::<LittleEndian>()?;
        Ok(Vec3::new(x, y, z))
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self.x)?;
        writer.write_f32::<LittleEndian>(self.y)?;
        writer.write_f32::<LittleEndian>(self.z)
    }
}

fn map_eof<R: Read>(reader: &TrackingReader<R>, start: u64, requested: usize, err: io::Error) -> MeshError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        let advanced = (reader.position() - start) as usize;
        MeshError::Truncated {
            offset: start,
            needed: requested - advanced,
        }
    } else {
        MeshError::Io(err)
    }
}

/// Read a `u32` count followed by that many elements.
pub fn read_array<T: Element, R: Read>(reader: &mut TrackingReader<R>) -> Result<Vec<T>> {
    let start = reader.position();
    let count = reader
        .read_u32::<LittleEndian>()
        .map_err(|e| map_eof(reader, start, 4, e))? as usize;

    let mut data = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let start = reader.position();
        let element = T::read_from(reader).map_err(|e| map_eof(reader, start, T::SIZE, e))?;
        data.push(element);
    }
    Ok(data)
}

/// Write a `u32` count followed by the flattened scalar stream.
pub fn write_array<T: Element, W: Write>(writer: &mut W, data: &[T]) -> Result<()> {
    writer.write_u32::<LittleEndian>(data.len() as u32)?;
    for element in data {
        element.write_to(writer)?;
    }
    Ok(())
}

/// Read a length-prefixed, NUL-terminated UTF-8 string.
///
/// The length includes the trailing NUL; the returned string does not.
pub fn read_string<R: Read>(reader: &mut TrackingReader<R>) -> Result<String> {
    let start = reader.position();
    let len = reader
        .read_u32::<LittleEndian>()
        .map_err(|e| map_eof(reader, start, 4, e))? as usize;

    let start = reader.position();
    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| map_eof(reader, start, len, e))?;

    let text = String::from_utf8(bytes)
        .map_err(|_| MeshError::malformed(start, "string is not valid utf-8"))?;
    Ok(text.trim_matches('\0').to_string())
}

/// Write a string as UTF-8 plus one NUL byte, length prefix included.
pub fn write_string<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    let len = text.len() + 1;
    writer.write_u32::<LittleEndian>(len as u32)?;
    writer.write_all(text.as_bytes())?;
    writer.write_all(&[0])?;
    Ok(())
}

/// Read a fixed-size opaque block.
pub fn read_bytes<const N: usize, R: Read>(reader: &mut TrackingReader<R>) -> Result<[u8; N]> {
    let start = reader.position();
    let mut buf = [0u8; N];
    reader
        .read_exact(&mut buf)
        .map_err(|e| map_eof(reader, start, N, e))?;
    Ok(buf)
}

/// Write `count` zero bytes.
pub fn write_zeros<W: Write>(writer: &mut W, count: usize) -> Result<()> {
    const ZEROS: [u8; 64] = [0; 64];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(ZEROS.len());
        writer.write_all(&ZEROS[..n])?;
        remaining -= n;
    }
    Ok(())
}

/// Write a file all-or-nothing: a temporary sibling is written first and
/// renamed over the target, so a failed write never leaves a partial file
/// visible.
pub fn write_file_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

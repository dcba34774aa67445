//! The binary mesh record and its decode/encode paths.
//!
//! One `.udsmesh` file holds one mesh. The layout is a fixed sequence of
//! length-prefixed strings and arrays interleaved with fixed-size byte
//! regions whose meaning is unrecovered; those regions are kept opaque
//! and written back as the literal patterns observed in files in the
//! wild.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use glam::{Vec2, Vec3};

use crate::codec::{self, TrackingReader};
use crate::error::{MeshError, Result};

/// File extension for binary mesh assets.
pub const MESH_EXTENSION: &str = "udsmesh";

/// Protocol-constant tag strings; a mismatch signals corruption.
pub const SOURCE_MODELS: &str = "SourceModels";
pub const STRUCT_PROPERTY: &str = "StructProperty";
pub const MESH_SOURCE_MODEL: &str = "DatasmithMeshSourceModel";

/// Literal 8-byte file header carried by every known mesh file.
const FILE_HEADER: [u8; 8] = [0x01, 0x00, 0x00, 0x00, 0xfd, 0x04, 0x00, 0x00];

/// Literal 5-byte block following the mesh name.
const POST_NAME_BLOCK: [u8; 5] = [0x00, 0x01, 0x00, 0x00, 0x00];

/// Literal 49-byte block preceding the geometry arrays.
#[rustfmt::skip]
const PRE_ARRAY_BLOCK: [u8; 49] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
    0x6c, 0x04, 0x00, 0x00,
    0x6c, 0x04, 0x00, 0x00,
    0x7d, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

/// How strictly decode treats recoverable corruption signals.
///
/// Structural violations (truncation, bad terminator, disagreeing loop
/// array lengths) are fatal under both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Protocol-constant mismatches abort the decode.
    #[default]
    Strict,
    /// Protocol-constant mismatches are logged and ignored.
    Lenient,
}

/// Fixed-size regions of the record whose interpretation is unrecovered.
///
/// Decode preserves the original bytes verbatim so callers can inspect
/// them; encode always writes the documented literal patterns instead, so
/// the checksum and the two unknown arrays are not reproduced
/// byte-for-byte. Round-trip fidelity is scoped to the semantic fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueBlocks {
    /// 8-byte file header.
    pub header: [u8; 8],
    /// 5 bytes after the mesh name.
    pub post_name: [u8; 5],
    /// 8-byte gap between the second and third tag strings.
    pub mid_tags: [u8; 8],
    /// 49 bytes before the geometry arrays.
    pub pre_arrays: [u8; 49],
    /// First unknown length-prefixed u32 array.
    pub unknown_a: Vec<u32>,
    /// Second unknown length-prefixed u32 array.
    pub unknown_b: Vec<u32>,
    /// 36 bytes after the geometry arrays.
    pub trailer: [u8; 36],
    /// 16-byte checksum; not deterministic across producer runs, and
    /// never recomputed on encode.
    pub checksum: [u8; 16],
}

impl Default for OpaqueBlocks {
    fn default() -> Self {
        Self {
            header: FILE_HEADER,
            post_name: POST_NAME_BLOCK,
            mid_tags: [0; 8],
            pre_arrays: PRE_ARRAY_BLOCK,
            unknown_a: Vec::new(),
            unknown_b: Vec::new(),
            trailer: [0; 36],
            checksum: [0; 16],
        }
    }
}

/// One mesh's geometry as stored in a `.udsmesh` file.
///
/// Normals and UVs are stored per vertex-loop (one entry per triangle
/// corner), not per vertex; `triangles`, `vertex_normals` and `uvs` are
/// always the same length. Material slots and smoothing groups are
/// per-triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshRecord {
    /// Mesh name as embedded in the file.
    pub name: String,
    /// Per-triangle local material slot indices.
    pub tris_material_slot: Vec<u32>,
    /// Per-triangle smoothing group ids.
    pub tris_smoothing_group: Vec<u32>,
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Per-loop vertex indices, three per triangle.
    pub triangles: Vec<u32>,
    /// Per-loop normals.
    pub vertex_normals: Vec<Vec3>,
    /// Per-loop texture coordinates.
    pub uvs: Vec<Vec2>,
    /// Unrecovered regions, preserved from decode.
    pub opaque: OpaqueBlocks,
}

impl MeshRecord {
    /// Create an empty record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of vertex-loop entries.
    pub fn loop_count(&self) -> usize {
        self.triangles.len()
    }

    /// Decode a full record from a reader.
    ///
    /// The reader must hold exactly one record; trailing bytes beyond the
    /// four-zero-byte terminator are a [`MeshError::Malformed`].
    pub fn decode<R: Read>(reader: R, policy: ReadPolicy) -> Result<Self> {
        let mut r = TrackingReader::new(reader);

        let header = codec::read_bytes::<8, _>(&mut r)?;
        let name = codec::read_string(&mut r)?;
        let post_name = codec::read_bytes::<5, _>(&mut r)?;

        let source_models = codec::read_string(&mut r)?;
        let struct_property = codec::read_string(&mut r)?;
        let mid_tags = codec::read_bytes::<8, _>(&mut r)?;
        let source_model = codec::read_string(&mut r)?;

        check_tag(&r, &source_models, SOURCE_MODELS, policy)?;
        check_tag(&r, &struct_property, STRUCT_PROPERTY, policy)?;
        check_tag(&r, &source_model, MESH_SOURCE_MODEL, policy)?;

        let pre_arrays = codec::read_bytes::<49, _>(&mut r)?;

        let tris_material_slot = codec::read_array::<u32, _>(&mut r)?;
        let tris_smoothing_group = codec::read_array::<u32, _>(&mut r)?;
        let vertices = codec::read_array::<Vec3, _>(&mut r)?;
        let triangles = codec::read_array::<u32, _>(&mut r)?;
        let unknown_a = codec::read_array::<u32, _>(&mut r)?;
        let unknown_b = codec::read_array::<u32, _>(&mut r)?;
        let vertex_normals = codec::read_array::<Vec3, _>(&mut r)?;
        let uvs = codec::read_array::<Vec2, _>(&mut r)?;

        let trailer = codec::read_bytes::<36, _>(&mut r)?;
        let checksum = codec::read_bytes::<16, _>(&mut r)?;

        let terminator_offset = r.position();
        let mut rest = Vec::new();
        r.read_to_end(&mut rest)?;
        if rest != [0u8; 4] {
            return Err(MeshError::malformed(
                terminator_offset,
                format!("expected 4 zero terminator bytes, found {} bytes", rest.len()),
            ));
        }

        if triangles.len() != uvs.len() || vertex_normals.len() != uvs.len() {
            return Err(MeshError::malformed(
                terminator_offset,
                format!(
                    "loop array lengths disagree: {} triangles, {} normals, {} uvs",
                    triangles.len(),
                    vertex_normals.len(),
                    uvs.len()
                ),
            ));
        }

        Ok(Self {
            name,
            tris_material_slot,
            tris_smoothing_group,
            vertices,
            triangles,
            vertex_normals,
            uvs,
            opaque: OpaqueBlocks {
                header,
                post_name,
                mid_tags,
                pre_arrays,
                unknown_a,
                unknown_b,
                trailer,
                checksum,
            },
        })
    }

    /// Encode the record.
    ///
    /// The opaque regions are written as the known literal patterns; the
    /// checksum and the two unknown arrays are zero-filled rather than
    /// preserved, so the output is not byte-identical to the source file
    /// of a decoded record.
    pub fn encode<W: Write>(&self, mut writer: W) -> Result<()> {
        let w = &mut writer;
        w.write_all(&FILE_HEADER)?;
        codec::write_string(w, &self.name)?;
        w.write_all(&POST_NAME_BLOCK)?;

        codec::write_string(w, SOURCE_MODELS)?;
        codec::write_string(w, STRUCT_PROPERTY)?;
        codec::write_zeros(w, 8)?;
        codec::write_string(w, MESH_SOURCE_MODEL)?;

        w.write_all(&PRE_ARRAY_BLOCK)?;

        codec::write_array(w, &self.tris_material_slot)?;
        codec::write_array(w, &self.tris_smoothing_group)?;
        codec::write_array(w, &self.vertices)?;
        codec::write_array(w, &self.triangles)?;
        // two empty unknown arrays
        codec::write_zeros(w, 8)?;
        codec::write_array(w, &self.vertex_normals)?;
        codec::write_array(w, &self.uvs)?;

        codec::write_zeros(w, 36)?;
        codec::write_zeros(w, 16)?;
        codec::write_zeros(w, 4)?;
        Ok(())
    }

    /// Encode into a fresh byte buffer.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode a record from a file.
    pub fn read_from_path(path: impl AsRef<Path>, policy: ReadPolicy) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::decode(bytes.as_slice(), policy)
    }

    /// Encode the record to a file, all-or-nothing.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.encode_to_vec()?;
        codec::write_file_atomic(path.as_ref(), &bytes)?;
        Ok(())
    }
}

fn check_tag<R: Read>(
    r: &TrackingReader<R>,
    found: &str,
    expected: &str,
    policy: ReadPolicy,
) -> Result<()> {
    if found == expected {
        return Ok(());
    }
    match policy {
        ReadPolicy::Strict => Err(MeshError::malformed(
            r.position(),
            format!("expected tag {expected:?}, found {found:?}"),
        )),
        ReadPolicy::Lenient => {
            log::warn!("mesh tag mismatch: expected {expected:?}, found {found:?}");
            Ok(())
        }
    }
}

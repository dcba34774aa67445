//! datasmith-mesh: codec for the Datasmith binary mesh format.
//!
//! One `.udsmesh` file carries one mesh: vertex positions, per-loop
//! triangle indices, per-loop normals and UVs, and per-triangle material
//! slot and smoothing group arrays, little-endian throughout.
//!
//! Several fixed-size regions of the format are reverse-engineered
//! placeholders with unrecovered semantics. Decode preserves their bytes
//! in [`OpaqueBlocks`]; encode writes the literal patterns observed in
//! files in the wild, so encoded output is byte-stable but not
//! byte-identical to third-party files (the 16-byte checksum in
//! particular is never recomputed).
//!
//! # Quick Start
//!
//! ```no_run
//! use datasmith_mesh::{MeshRecord, ReadPolicy};
//!
//! let record = MeshRecord::read_from_path("Cube.udsmesh", ReadPolicy::Strict)?;
//! assert_eq!(record.triangles.len(), record.uvs.len());
//! record.write_to_path("Cube_copy.udsmesh")?;
//! # Ok::<(), datasmith_mesh::MeshError>(())
//! ```

pub mod codec;
pub mod error;
pub mod record;

pub use error::{MeshError, Result};
pub use record::{MeshRecord, OpaqueBlocks, ReadPolicy, MESH_EXTENSION};

//! Error types for datasmith-scene.

use std::path::PathBuf;

use datasmith_mesh::MeshError;
use thiserror::Error;

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors that can occur while parsing, rendering or saving a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// XML syntax error in the scene document.
    #[error("xml error at byte {position}: {message}")]
    Xml {
        /// Reader error message.
        message: String,
        /// Byte position reported by the reader.
        position: u64,
    },

    /// Structurally invalid scene document.
    #[error("invalid scene document: {0}")]
    Parse(String),

    /// Actor element without the required `Transform` child.
    #[error("actor '{actor}' has no Transform element")]
    MissingTransform {
        /// Name of the offending actor.
        actor: String,
    },

    /// A triangle references a material id the mesh never declared.
    #[error("mesh '{mesh}' references undeclared material id {material_id}")]
    MaterialIndex {
        /// Name of the offending mesh.
        mesh: String,
        /// The undeclared source material id.
        material_id: u32,
    },

    /// Failure reading a referenced binary mesh asset.
    #[error("mesh file {path:?}: {source}")]
    MeshFile {
        /// Path of the asset that failed.
        path: PathBuf,
        /// Underlying codec error.
        source: MeshError,
    },

    /// Mesh codec error outside of asset resolution.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Create a document-structure error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

//! Error types for datasmith-mesh.

use thiserror::Error;

/// Result type for mesh codec operations.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while reading or writing a binary mesh record.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The stream ended before a declared length was satisfied.
    #[error("truncated mesh data: needed {needed} more bytes at offset {offset}")]
    Truncated {
        /// Byte offset where the unsatisfied read started.
        offset: u64,
        /// Bytes still required when the stream ended.
        needed: usize,
    },

    /// The data violates the format's structural invariants.
    #[error("malformed mesh data at offset {offset}: {reason}")]
    Malformed {
        /// Byte offset of the violation.
        offset: u64,
        /// What was violated.
        reason: String,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Create a malformed-data error at the given offset.
    pub fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            reason: reason.into(),
        }
    }
}

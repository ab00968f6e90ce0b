//! Error types for capture, persistence and reconstruction

use skein_artifact::{ArtifactError, NodeId};
use std::path::PathBuf;

/// Errors while persisting or reconstructing a workspace
///
/// Every variant aborts the whole load: no partially reconstructed tree is
/// ever returned.
#[derive(Debug, thiserror::Error)]
pub enum MementoError {
    /// Node discriminator has no registered constructor
    #[error("unknown node type: '{type_name}' (node {node})")]
    UnknownNodeType { type_name: String, node: NodeId },

    /// Capability discriminator has no registered constructor
    #[error("unknown capability type: '{type_name}' (node {node}, key '{key}')")]
    UnknownCapabilityType {
        type_name: String,
        node: NodeId,
        key: String,
    },

    /// Persisted format version not understood
    #[error("unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Structurally inconsistent state
    #[error("malformed state: {0}")]
    MalformedState(String),

    /// Tree operation failed while rebuilding
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// JSON encoding/decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding/decoding failed
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File read/write failed
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MementoError {
    /// Create malformed-state error
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedState(message.into())
    }

    /// Create IO error for path
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if error is a factory lookup failure
    #[inline]
    #[must_use]
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownNodeType { .. } | Self::UnknownCapabilityType { .. }
        )
    }
}

//! Snapshot files on disk
//!
//! `.yaml`/`.yml` files are YAML; everything else is JSON.

use crate::error::MementoError;
use crate::state::WorkspaceState;
use std::path::Path;

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

impl StateFormat {
    /// Pick the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }

    /// Encode a snapshot
    ///
    /// # Errors
    /// Returns `Json`/`Yaml` if encoding fails
    pub fn encode(self, state: &WorkspaceState) -> Result<String, MementoError> {
        match self {
            Self::Json => state.to_json(),
            Self::Yaml => state.to_yaml(),
        }
    }

    /// Decode and version-check a snapshot
    ///
    /// # Errors
    /// Returns `Json`/`Yaml` or `UnsupportedVersion`
    pub fn decode(self, text: &str) -> Result<WorkspaceState, MementoError> {
        match self {
            Self::Json => WorkspaceState::from_json(text),
            Self::Yaml => WorkspaceState::from_yaml(text),
        }
    }
}

/// Read a snapshot file
///
/// # Errors
/// - `Io` if the file cannot be read
/// - decoding errors as in [`StateFormat::decode`]
pub async fn load_state(path: impl AsRef<Path>) -> Result<WorkspaceState, MementoError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MementoError::io_error(path, e))?;
    let state = StateFormat::from_path(path).decode(&text)?;
    tracing::info!(path = %path.display(), nodes = state.len(), "loaded workspace state");
    Ok(state)
}

/// Write a snapshot file, format chosen by extension
///
/// # Errors
/// - encoding errors as in [`StateFormat::encode`]
/// - `Io` if the file cannot be written
pub async fn save_state(path: impl AsRef<Path>, state: &WorkspaceState) -> Result<(), MementoError> {
    let path = path.as_ref();
    let text = StateFormat::from_path(path).encode(state)?;
    tokio::fs::write(path, text)
        .await
        .map_err(|e| MementoError::io_error(path, e))?;
    tracing::info!(path = %path.display(), nodes = state.len(), "saved workspace state");
    Ok(())
}

//! File-name capability

use skein_artifact::{Capability, CapabilityCore, NodeView};
use skein_memento::{DecoratorState, MementoError, Restorable};
use std::any::Any;
use std::path::Path;

/// Default key of [`FileCapability`]
pub const FILE_KEY: &str = "FileProperties";

/// Node kind of nodes created as files
pub const FILE_NODE_KIND: &str = "File";

/// File name property
pub const FILE_NAME: &str = "FileName";

/// Names the file a node materialises as
///
/// Produces nothing by itself; content capabilities on the same node read
/// the name and write the file.
#[derive(Debug)]
pub struct FileCapability {
    core: CapabilityCore,
}

impl FileCapability {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CapabilityCore::new(FILE_KEY),
        }
    }

    /// Configured file name, if non-empty
    #[must_use]
    pub fn file_name<'a>(&self, node: NodeView<'a>) -> Option<&'a str> {
        self.core.non_empty_str(node, FILE_NAME).ok().flatten()
    }

    /// Extension of the configured file name
    #[must_use]
    pub fn extension<'a>(&self, node: NodeView<'a>) -> Option<&'a str> {
        self.file_name(node)
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
    }
}

impl Default for FileCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl Capability for FileCapability {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn core(&self) -> &CapabilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CapabilityCore {
        &mut self.core
    }

    fn display_text(&self, node: NodeView<'_>) -> Option<String> {
        self.file_name(node).map(str::to_string)
    }

    fn display_icon(&self) -> Option<&'static str> {
        Some("file")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Restorable for FileCapability {
    const TYPE_NAME: &'static str = "FileCapability";

    fn restore(state: &DecoratorState) -> Result<Self, MementoError> {
        Ok(Self {
            core: CapabilityCore::new(state.key.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_artifact::{ArtifactError, ArtifactTree};

    #[test]
    fn never_generates() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        tree.add_capability(root, FileCapability::new()).unwrap();
        tree.set_capability_property(root, FILE_KEY, FILE_NAME, "lib.rs")
            .unwrap();

        let view = tree.view(root).unwrap();
        let cap = tree.capability::<FileCapability>(root).unwrap();
        assert!(!cap.can_generate(view));
        assert_eq!(cap.file_name(view), Some("lib.rs"));
        assert_eq!(cap.extension(view), Some("rs"));
        assert_eq!(tree.display_icon(root), Some("file"));
    }

    #[test]
    fn second_file_properties_key_rejected() {
        let mut tree = ArtifactTree::new();
        let root = tree.root();
        tree.add_capability(root, FileCapability::new()).unwrap();
        let err = tree.add_capability(root, FileCapability::new()).unwrap_err();
        assert!(matches!(err, ArtifactError::DuplicateCapability { key, .. } if key == FILE_KEY));
    }
}

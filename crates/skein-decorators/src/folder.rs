//! Folder capability

use async_trait::async_trait;
use skein_artifact::{
    Capability, CapabilityCore, CapabilityError, GenerationContext, GenerationPhase, NodeView,
};
use skein_memento::{DecoratorState, MementoError, Restorable};
use std::any::Any;
use std::path::PathBuf;

/// Default key of [`FolderCapability`]
pub const FOLDER_KEY: &str = "Folder";

/// Node kind of nodes created as folders
pub const FOLDER_NODE_KIND: &str = "Folder";

/// Folder name property
pub const NAME: &str = "Name";

/// Makes a node a directory named by its `Name` property
///
/// Runs in [`GenerationPhase::Prepare`] so the directory exists before any
/// file capability on the same node emits.
#[derive(Debug)]
pub struct FolderCapability {
    core: CapabilityCore,
}

impl FolderCapability {
    /// Create unattached folder capability
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CapabilityCore::new(FOLDER_KEY),
        }
    }

    /// Configured folder name, if non-empty
    #[must_use]
    pub fn name<'a>(&self, node: NodeView<'a>) -> Option<&'a str> {
        self.core.non_empty_str(node, NAME).ok().flatten()
    }
}

impl Default for FolderCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Capability for FolderCapability {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn core(&self) -> &CapabilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CapabilityCore {
        &mut self.core
    }

    fn phase(&self) -> GenerationPhase {
        GenerationPhase::Prepare
    }

    fn can_generate(&self, node: NodeView<'_>) -> bool {
        self.name(node).is_some()
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<(), CapabilityError> {
        let node = ctx.node();
        let name = self
            .name(node)
            .ok_or_else(|| CapabilityError::invalid_property(NAME, "folder name is empty"))?;
        ctx.create_dir(resolve_directory(node).join(name)).await?;
        Ok(())
    }

    fn display_text(&self, node: NodeView<'_>) -> Option<String> {
        self.name(node).map(str::to_string)
    }

    fn display_icon(&self) -> Option<&'static str> {
        Some("folder")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Restorable for FolderCapability {
    const TYPE_NAME: &'static str = "FolderCapability";

    fn restore(state: &DecoratorState) -> Result<Self, MementoError> {
        Ok(Self {
            core: CapabilityCore::new(state.key.clone()),
        })
    }
}

/// Directory a node's output lands in, relative to the output root
///
/// Joins the names of all named folder ancestors (excluding `node`),
/// root first. Unnamed folders and plain nodes contribute nothing.
#[must_use]
pub fn resolve_directory(node: NodeView<'_>) -> PathBuf {
    let mut names: Vec<&str> = node
        .tree()
        .ancestors(node.id())
        .filter_map(|ancestor| {
            ancestor
                .capability::<FolderCapability>()
                .and_then(|folder| folder.name(ancestor))
        })
        .collect();
    names.reverse();
    names.iter().collect()
}

//! Typed façades: "this node, as a folder" and "this node, as a file"

use crate::file::{FileCapability, FILE_NAME, FILE_NODE_KIND};
use crate::folder::{FolderCapability, FOLDER_NODE_KIND, NAME};
use crate::text::{TextContentCapability, TEMPLATE, TEXT};
use skein_artifact::{ArtifactError, ArtifactTree, Capability, Host, NodeId};

/// Node viewed as a folder
#[derive(Debug)]
pub struct FolderHost<'t> {
    host: Host<'t, FolderCapability>,
}

impl<'t> FolderHost<'t> {
    /// Create a named folder node under `parent`
    ///
    /// # Errors
    /// Same as [`Host::create`]
    pub fn create(tree: &'t mut ArtifactTree, parent: NodeId, name: &str) -> Result<Self, ArtifactError> {
        let mut host = Host::create(tree, parent, FOLDER_NODE_KIND, FolderCapability::new)?;
        host.set(NAME, name)?;
        Ok(Self { host })
    }

    /// Turn an existing node into a folder (idempotent)
    ///
    /// # Errors
    /// Same as [`Host::attach`]
    pub fn attach(tree: &'t mut ArtifactTree, node: NodeId) -> Result<Self, ArtifactError> {
        Ok(Self {
            host: Host::attach(tree, node, FolderCapability::new)?,
        })
    }

    #[inline]
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.host.node_id()
    }

    /// Folder name
    ///
    /// # Errors
    /// Same as [`Host::get_str`]
    pub fn name(&self) -> Result<Option<&str>, ArtifactError> {
        self.host.get_str(NAME)
    }

    /// Rename the folder
    ///
    /// # Errors
    /// Same as [`Host::set`]
    pub fn set_name(&mut self, name: &str) -> Result<&mut Self, ArtifactError> {
        self.host.set(NAME, name)?;
        Ok(self)
    }
}

/// Node viewed as a file
#[derive(Debug)]
pub struct FileHost<'t> {
    host: Host<'t, FileCapability>,
}

impl<'t> FileHost<'t> {
    /// Create a file node named `file_name` under `parent`
    ///
    /// # Errors
    /// Same as [`Host::create`]
    pub fn create(
        tree: &'t mut ArtifactTree,
        parent: NodeId,
        file_name: &str,
    ) -> Result<Self, ArtifactError> {
        let mut host = Host::create(tree, parent, FILE_NODE_KIND, FileCapability::new)?;
        host.set(FILE_NAME, file_name)?;
        Ok(Self { host })
    }

    /// Turn an existing node into a file (idempotent)
    ///
    /// # Errors
    /// Same as [`Host::attach`]
    pub fn attach(tree: &'t mut ArtifactTree, node: NodeId) -> Result<Self, ArtifactError> {
        Ok(Self {
            host: Host::attach(tree, node, FileCapability::new)?,
        })
    }

    #[inline]
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.host.node_id()
    }

    /// File name
    ///
    /// # Errors
    /// Same as [`Host::get_str`]
    pub fn file_name(&self) -> Result<Option<&str>, ArtifactError> {
        self.host.get_str(FILE_NAME)
    }

    /// Rename the file
    ///
    /// # Errors
    /// Same as [`Host::set`]
    pub fn set_file_name(&mut self, file_name: &str) -> Result<&mut Self, ArtifactError> {
        self.host.set(FILE_NAME, file_name)?;
        Ok(self)
    }

    /// Set literal content, attaching text content if needed
    ///
    /// # Errors
    /// Same as [`ArtifactTree::add_or_get_capability`]
    pub fn set_text(&mut self, text: &str) -> Result<&mut Self, ArtifactError> {
        self.set_content(TEXT, text)
    }

    /// Set template content, attaching text content if needed
    ///
    /// # Errors
    /// Same as [`ArtifactTree::add_or_get_capability`]
    pub fn set_template(&mut self, template: &str) -> Result<&mut Self, ArtifactError> {
        self.set_content(TEMPLATE, template)
    }

    fn set_content(&mut self, name: &str, value: &str) -> Result<&mut Self, ArtifactError> {
        let node = self.host.node_id();
        let tree = self.host.tree_mut();
        let key = tree
            .add_or_get_capability(node, TextContentCapability::new)?
            .key()
            .to_string();
        tree.set_capability_property(node, &key, name, value)?;
        Ok(self)
    }
}

//! Text-content capability
//!
//! Writes literal `Text`, or a `Template` rendered against the node's
//! property store, to the file named by the sibling [`FileCapability`].

use crate::file::{FileCapability, FILE_NAME};
use crate::folder::resolve_directory;
use crate::render::PlaceholderRenderer;
use async_trait::async_trait;
use skein_artifact::{
    Capability, CapabilityCore, CapabilityError, GenerationContext, NodeView, Preview,
    Previewable, TemplateRenderer,
};
use skein_memento::{DecoratorState, MementoError, Restorable};
use std::any::Any;

/// Default key of [`TextContentCapability`]
pub const TEXT_KEY: &str = "TextContent";

/// Literal text property
pub const TEXT: &str = "Text";

/// Template property; wins over `Text` when both are set
pub const TEMPLATE: &str = "Template";

/// Source of a node's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource<'a> {
    Literal(&'a str),
    Template(&'a str),
}

#[derive(Debug)]
pub struct TextContentCapability {
    core: CapabilityCore,
}

impl TextContentCapability {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: CapabilityCore::new(TEXT_KEY),
        }
    }

    /// Configured text source
    ///
    /// An empty literal still counts: it produces an empty file.
    #[must_use]
    pub fn source<'a>(&self, node: NodeView<'a>) -> Option<TextSource<'a>> {
        let read = |name| {
            self.core
                .property(node, name)
                .ok()
                .flatten()
                .and_then(|v| v.as_str())
        };
        read(TEMPLATE)
            .map(TextSource::Template)
            .or_else(|| read(TEXT).map(TextSource::Literal))
    }

    fn sibling_file<'a>(node: NodeView<'a>) -> Result<&'a FileCapability, CapabilityError> {
        node.capability::<FileCapability>()
            .ok_or_else(|| CapabilityError::MissingCapability {
                required: FileCapability::TYPE_NAME.to_string(),
            })
    }
}

impl Default for TextContentCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Capability for TextContentCapability {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn core(&self) -> &CapabilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CapabilityCore {
        &mut self.core
    }

    fn can_generate(&self, node: NodeView<'_>) -> bool {
        self.source(node).is_some()
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<(), CapabilityError> {
        let node = ctx.node();
        let file = Self::sibling_file(node)?;
        let file_name = file.file_name(node).ok_or_else(|| {
            CapabilityError::invalid_property(FILE_NAME, "file name is empty")
        })?;
        let text = match self.source(node) {
            Some(TextSource::Literal(text)) => text.to_string(),
            Some(TextSource::Template(template)) => {
                ctx.render(template, &node.properties().to_json_object())?
            }
            None => {
                return Err(CapabilityError::invalid_property(
                    TEXT,
                    "neither Text nor Template is set",
                ))
            }
        };
        let path = resolve_directory(node).join(file_name);
        tracing::debug!(node = %node.id(), path = %path.display(), "emitting text content");
        ctx.write_text(path, &text).await?;
        Ok(())
    }

    fn as_previewable(&self) -> Option<&dyn Previewable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Previewable for TextContentCapability {
    fn can_preview(&self, node: NodeView<'_>) -> bool {
        self.source(node).is_some()
    }

    fn create_preview(&self, node: NodeView<'_>) -> Option<Preview> {
        let content = match self.source(node)? {
            TextSource::Literal(text) => text.to_string(),
            TextSource::Template(template) => PlaceholderRenderer::lenient()
                .render(template, &node.properties().to_json_object())
                .ok()?,
        };
        let syntax = node
            .capability::<FileCapability>()
            .and_then(|file| file.extension(node))
            .map(str::to_string);
        Some(Preview::Text { content, syntax })
    }
}

impl Restorable for TextContentCapability {
    const TYPE_NAME: &'static str = "TextContentCapability";

    fn restore(state: &DecoratorState) -> Result<Self, MementoError> {
        Ok(Self {
            core: CapabilityCore::new(state.key.clone()),
        })
    }
}

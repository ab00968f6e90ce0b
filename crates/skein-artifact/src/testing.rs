//! Capabilities used by this crate's unit tests

use crate::capability::{Capability, CapabilityCore, GenerationPhase};
use crate::error::CapabilityError;
use crate::generate::GenerationContext;
use crate::tree::NodeView;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Inert capability with an optional display contribution
#[derive(Debug)]
pub(crate) struct Tag {
    core: CapabilityCore,
    display: Option<String>,
}

impl Tag {
    pub(crate) fn new(key: &str) -> Self {
        Self {
            core: CapabilityCore::new(key),
            display: None,
        }
    }

    pub(crate) fn with_display(mut self, text: &str) -> Self {
        self.display = Some(text.to_string());
        self
    }
}

impl Capability for Tag {
    fn type_name(&self) -> &'static str {
        "Tag"
    }

    fn core(&self) -> &CapabilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CapabilityCore {
        &mut self.core
    }

    fn display_text(&self, _node: NodeView<'_>) -> Option<String> {
        self.display.clone()
    }

    fn display_icon(&self) -> Option<&'static str> {
        self.display.as_ref().map(|_| "tag")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Capability counting its generate calls
#[derive(Debug)]
pub(crate) struct Probe {
    core: CapabilityCore,
    eligible: bool,
    phase: GenerationPhase,
    write: Option<(String, String)>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl Probe {
    pub(crate) fn new(key: &str) -> Self {
        Self {
            core: CapabilityCore::new(key),
            eligible: true,
            phase: GenerationPhase::Emit,
            write: None,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn eligible(mut self, eligible: bool) -> Self {
        self.eligible = eligible;
        self
    }

    pub(crate) fn with_phase(mut self, phase: GenerationPhase) -> Self {
        self.phase = phase;
        self
    }

    pub(crate) fn writing(mut self, path: &str, text: &str) -> Self {
        self.write = Some((path.to_string(), text.to_string()));
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl Capability for Probe {
    fn type_name(&self) -> &'static str {
        "Probe"
    }

    fn core(&self) -> &CapabilityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CapabilityCore {
        &mut self.core
    }

    fn phase(&self) -> GenerationPhase {
        self.phase
    }

    fn can_generate(&self, _node: NodeView<'_>) -> bool {
        self.eligible
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<(), CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CapabilityError::InvalidState("probe failure".to_string()));
        }
        if let Some((path, text)) = &self.write {
            ctx.write_text(path, text).await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

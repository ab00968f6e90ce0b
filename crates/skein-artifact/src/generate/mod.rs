//! Generation pipeline
//!
//! Turns an artifact (sub)tree into filesystem side effects.
//!
//! # Walk
//!
//! Pre-order, depth-first, in child-list order. Per node:
//! 1. **Self phase**: every capability whose `can_generate` is true runs
//!    once, sorted by [`GenerationPhase`] then attachment order.
//! 2. **Children phase**: each child is visited recursively.
//!
//! # Cancellation
//!
//! Cooperative. The token is checked at the start of every node visit and
//! before every capability. Files already written stay on disk; a cancelled
//! run returns [`GenerationOutcome::Cancelled`], not an error.
//!
//! # Failure
//!
//! The first failing capability aborts the run with a [`GenerationError`]
//! naming the node, capability and phase. Nothing is retried.
//!
//! [`GenerationPhase`]: crate::GenerationPhase

mod config;
mod context;
mod progress;

pub use config::{GenerationConfig, OverwritePolicy};
pub use context::{GenerationContext, TemplateRenderer, VerbatimRenderer, WriteOutcome};
pub use progress::{NullProgress, ProgressEvent, ProgressObserver};

use crate::error::{ArtifactError, CapabilityError, GenerationError};
use crate::id::NodeId;
use crate::tree::ArtifactTree;
use context::Session;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Summary of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Nodes whose visit started
    pub nodes_visited: usize,
    /// Capabilities whose `generate` completed
    pub capabilities_run: usize,
    /// Files written (or planned, in dry-run mode), in write order
    pub files_written: Vec<PathBuf>,
    /// Existing files left untouched by `OverwritePolicy::Skip`
    pub files_skipped: Vec<PathBuf>,
    /// Directories ensured, in creation order
    pub directories_created: Vec<PathBuf>,
}

/// How a run ended, when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Whole subtree generated
    Completed(GenerationReport),
    /// Stopped by the cancellation token; the report covers work done so far
    Cancelled(GenerationReport),
}

impl GenerationOutcome {
    /// Check if the run was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Report of the run
    #[inline]
    #[must_use]
    pub fn report(&self) -> &GenerationReport {
        match self {
            Self::Completed(r) | Self::Cancelled(r) => r,
        }
    }

    /// Consume into the report
    #[inline]
    #[must_use]
    pub fn into_report(self) -> GenerationReport {
        match self {
            Self::Completed(r) | Self::Cancelled(r) => r,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Cancelled,
}

/// Tree walker running capability generation
#[derive(Debug)]
pub struct Generator<'t> {
    tree: &'t ArtifactTree,
    config: GenerationConfig,
    renderer: Arc<dyn TemplateRenderer>,
}

impl<'t> Generator<'t> {
    /// Create generator over a tree
    #[must_use]
    pub fn new(tree: &'t ArtifactTree, config: GenerationConfig) -> Self {
        Self {
            tree,
            config,
            renderer: Arc::new(VerbatimRenderer),
        }
    }

    /// Use a specific template renderer
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Run configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate the subtree rooted at `root`
    ///
    /// # Errors
    /// Returns `GenerationError` for the first failing node or capability;
    /// cancellation is reported through `Ok(GenerationOutcome::Cancelled)`.
    pub async fn generate(
        &self,
        root: NodeId,
        progress: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        tracing::info!(
            %root,
            output_root = %self.config.output_root.display(),
            dry_run = self.config.dry_run,
            "generation started"
        );
        let session = self.session(cancel);
        let flow = match self.visit(&session, root, progress).await {
            Ok(flow) => flow,
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                return Err(e);
            }
        };
        let report = session.into_report();
        match flow {
            Flow::Continue => {
                tracing::info!(
                    nodes = report.nodes_visited,
                    capabilities = report.capabilities_run,
                    files = report.files_written.len(),
                    "generation completed"
                );
                Ok(GenerationOutcome::Completed(report))
            }
            Flow::Cancelled => {
                tracing::warn!(nodes = report.nodes_visited, "generation cancelled");
                Ok(GenerationOutcome::Cancelled(report))
            }
        }
    }

    /// Run one capability of one node directly
    ///
    /// # Errors
    /// - `InvalidState` if the capability's `can_generate` is false
    /// - `CapabilityNotFound`/`NodeNotFound` for unknown handles
    /// - any failure of the capability itself
    pub async fn generate_capability(
        &self,
        node: NodeId,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<GenerationReport, GenerationError> {
        let view = self
            .tree
            .view(node)
            .ok_or_else(|| GenerationError::at_node(node, ArtifactError::NodeNotFound(node)))?;
        let capability = view.capabilities().get(key).ok_or_else(|| {
            GenerationError::at_node(
                node,
                ArtifactError::CapabilityNotFound {
                    node,
                    key: key.to_string(),
                },
            )
        })?;
        if !capability.can_generate(view) {
            return Err(GenerationError::at_capability(
                node,
                key,
                capability.phase(),
                CapabilityError::InvalidState(format!(
                    "capability '{key}' is not ready to generate"
                )),
            ));
        }

        let session = self.session(cancel);
        let ctx = GenerationContext::new(view, capability.key(), &session);
        capability
            .generate(&ctx)
            .await
            .map_err(|e| GenerationError::at_capability(node, key, capability.phase(), e))?;
        session.record(|r| r.capabilities_run += 1);
        Ok(session.into_report())
    }

    fn session(&self, cancel: &CancellationToken) -> Session {
        Session::new(self.config.clone(), Arc::clone(&self.renderer), cancel.clone())
    }

    fn visit<'a>(
        &'a self,
        session: &'a Session,
        id: NodeId,
        progress: &'a dyn ProgressObserver,
    ) -> BoxFuture<'a, Result<Flow, GenerationError>> {
        Box::pin(async move {
            if session.cancel.is_cancelled() {
                return Ok(Flow::Cancelled);
            }
            let view = self
                .tree
                .view(id)
                .ok_or_else(|| GenerationError::at_node(id, ArtifactError::NodeNotFound(id)))?;
            session.record(|r| r.nodes_visited += 1);

            let children = view.node().children();
            let total = 1 + children.len();
            tracing::debug!(node = %id, kind = view.kind(), children = children.len(), "visiting node");

            // self phase: one event per capability, all at step 1
            let mut generated = 0usize;
            for capability in view.capabilities().generation_order(view) {
                if session.cancel.is_cancelled() {
                    return Ok(Flow::Cancelled);
                }
                let key = capability.key();
                let phase = capability.phase();
                tracing::debug!(node = %id, key, %phase, "running capability");
                let ctx = GenerationContext::new(view, key, session);
                capability
                    .generate(&ctx)
                    .await
                    .map_err(|e| GenerationError::at_capability(id, key, phase, e))?;
                session.record(|r| r.capabilities_run += 1);
                generated += 1;
                progress.report(ProgressEvent::new(id, format!("generated {key}"), 1, total));
            }
            if generated == 0 {
                progress.report(ProgressEvent::new(id, "nothing to generate", 1, total));
            }

            // children phase
            for (index, child) in children.iter().enumerate() {
                if self.visit(session, *child, progress).await? == Flow::Cancelled {
                    return Ok(Flow::Cancelled);
                }
                progress.report(ProgressEvent::new(
                    id,
                    format!("child {} of {} done", index + 1, children.len()),
                    index + 2,
                    total,
                ));
            }
            Ok(Flow::Continue)
        })
    }
}

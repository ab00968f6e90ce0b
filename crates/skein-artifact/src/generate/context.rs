//! Per-capability generation context and output writer
//!
//! All filesystem effects of a run go through [`GenerationContext`], which
//! resolves paths against the output root, refuses to write the same path
//! twice in one run, applies the overwrite policy and writes atomically.

use crate::error::{CapabilityError, RenderError};
use crate::generate::config::{GenerationConfig, OverwritePolicy};
use crate::generate::GenerationReport;
use crate::tree::NodeView;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Debug;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Template engine seam
///
/// Content capabilities render their text through this trait; the engine
/// itself lives outside this crate.
pub trait TemplateRenderer: Send + Sync + Debug {
    /// Render `template` against `model`
    ///
    /// # Errors
    /// Returns `RenderError` if the template cannot be rendered
    fn render(&self, template: &str, model: &Value) -> Result<String, RenderError>;
}

/// Renderer returning templates unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimRenderer;

impl TemplateRenderer for VerbatimRenderer {
    fn render(&self, template: &str, _model: &Value) -> Result<String, RenderError> {
        Ok(template.to_string())
    }
}

/// Result of a single write request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// File written
    Written,
    /// Existing file kept (`OverwritePolicy::Skip`)
    Skipped,
    /// Dry run: nothing touched
    Planned,
}

/// State shared by every node visit of one run
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) config: GenerationConfig,
    pub(crate) renderer: Arc<dyn TemplateRenderer>,
    pub(crate) cancel: CancellationToken,
    claimed: Mutex<HashSet<PathBuf>>,
    report: Mutex<GenerationReport>,
}

impl Session {
    pub(crate) fn new(
        config: GenerationConfig,
        renderer: Arc<dyn TemplateRenderer>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            renderer,
            cancel,
            claimed: Mutex::new(HashSet::new()),
            report: Mutex::new(GenerationReport::default()),
        }
    }

    pub(crate) fn record(&self, f: impl FnOnce(&mut GenerationReport)) {
        f(&mut self.report.lock());
    }

    pub(crate) fn into_report(self) -> GenerationReport {
        self.report.into_inner()
    }

    /// Reserve a path for this run; false if already reserved
    fn claim(&self, path: &Path) -> bool {
        self.claimed.lock().insert(path.to_path_buf())
    }
}

/// Everything a capability may use while generating
#[derive(Debug)]
pub struct GenerationContext<'a> {
    node: NodeView<'a>,
    key: &'a str,
    session: &'a Session,
}

impl<'a> GenerationContext<'a> {
    pub(crate) fn new(node: NodeView<'a>, key: &'a str, session: &'a Session) -> Self {
        Self { node, key, session }
    }

    /// Node being generated
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeView<'a> {
        self.node
    }

    /// Key of the capability being run
    #[inline]
    #[must_use]
    pub fn capability_key(&self) -> &'a str {
        self.key
    }

    /// Run configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.session.config
    }

    /// Cancellation signal of the run
    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.session.cancel
    }

    /// Render a template with the run's renderer
    ///
    /// # Errors
    /// Returns `CapabilityError::Render` on template failure
    pub fn render(&self, template: &str, model: &Value) -> Result<String, CapabilityError> {
        Ok(self.session.renderer.render(template, model)?)
    }

    /// Resolve a relative path against the output root
    ///
    /// # Errors
    /// Returns `PathEscapesRoot` for absolute paths or `..` components
    pub fn output_path(&self, relative: impl AsRef<Path>) -> Result<PathBuf, CapabilityError> {
        let relative = relative.as_ref();
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(CapabilityError::PathEscapesRoot(relative.to_path_buf()));
        }
        Ok(self.session.config.output_root.join(relative))
    }

    /// Create a directory (and its parents) under the output root
    ///
    /// Idempotent; in dry-run mode only the report is updated.
    ///
    /// # Errors
    /// - `PathEscapesRoot` for paths outside the output root
    /// - `Io` if the directory cannot be created
    pub async fn create_dir(&self, relative: impl AsRef<Path>) -> Result<PathBuf, CapabilityError> {
        let target = self.output_path(relative)?;
        if !self.session.config.dry_run {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|e| CapabilityError::io_error(&target, e))?;
        }
        tracing::debug!(path = %target.display(), dry_run = self.session.config.dry_run, "directory ready");
        let recorded = target.clone();
        self.session.record(|r| r.directories_created.push(recorded));
        Ok(target)
    }

    /// Write text to a file under the output root
    ///
    /// The content is written to a temporary file in the target directory
    /// and renamed into place, so the target never holds partial content.
    ///
    /// # Errors
    /// - `PathEscapesRoot` for paths outside the output root
    /// - `DuplicateOutput` if the path was already written in this run
    /// - `OutputExists` if the file exists and the policy is `Fail`
    /// - `Io` on filesystem failure
    pub async fn write_text(
        &self,
        relative: impl AsRef<Path>,
        text: &str,
    ) -> Result<WriteOutcome, CapabilityError> {
        let target = self.output_path(relative)?;
        if !self.session.claim(&target) {
            return Err(CapabilityError::DuplicateOutput(target));
        }

        if self.session.config.dry_run {
            tracing::info!(path = %target.display(), bytes = text.len(), "dry run: would write");
            self.session.record(|r| r.files_written.push(target));
            return Ok(WriteOutcome::Planned);
        }

        let exists = tokio::fs::try_exists(&target)
            .await
            .map_err(|e| CapabilityError::io_error(&target, e))?;
        if exists {
            match self.session.config.overwrite {
                OverwritePolicy::Overwrite => {}
                OverwritePolicy::Skip => {
                    tracing::info!(path = %target.display(), "exists, skipped");
                    self.session.record(|r| r.files_skipped.push(target));
                    return Ok(WriteOutcome::Skipped);
                }
                OverwritePolicy::Fail => return Err(CapabilityError::OutputExists(target)),
            }
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CapabilityError::io_error(parent, e))?;
        }

        // under Fail the rename itself refuses to replace a file that
        // appeared after the existence check
        let clobber = self.session.config.overwrite != OverwritePolicy::Fail;
        let path = target.clone();
        let contents = text.to_string();
        tokio::task::spawn_blocking(move || write_atomic(&path, &contents, clobber))
            .await
            .map_err(|e| CapabilityError::io_error(&target, std::io::Error::other(e)))?
            .map_err(|e| {
                if !clobber && e.kind() == std::io::ErrorKind::AlreadyExists {
                    CapabilityError::OutputExists(target.clone())
                } else {
                    CapabilityError::io_error(&target, e)
                }
            })?;

        tracing::info!(path = %target.display(), bytes = text.len(), "wrote file");
        self.session.record(|r| r.files_written.push(target));
        Ok(WriteOutcome::Written)
    }
}

/// Write via temp file + rename in the same directory
///
/// Without `clobber` an existing target fails with `AlreadyExists`.
fn write_atomic(path: &Path, content: &str, clobber: bool) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    if clobber {
        temp.persist(path).map_err(|e| e.error)?;
    } else {
        temp.persist_noclobber(path).map_err(|e| e.error)?;
    }
    Ok(())
}

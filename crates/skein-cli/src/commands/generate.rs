use super::load_tree;
use crate::cli::GenerateArgs;
use crate::config::SkeinConfig;
use skein_artifact::{
    CancellationToken, GenerationConfig, GenerationOutcome, GenerationReport, Generator,
    ProgressEvent,
};
use skein_decorators::PlaceholderRenderer;
use std::fmt;
use std::sync::Arc;

/// How a generate command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Result of `skein generate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub status: RunStatus,
    pub config: GenerationConfig,
    pub report: GenerationReport,
}

impl fmt::Display for GenerateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, done) = if self.config.dry_run {
            ("planned", "planned")
        } else {
            ("wrote", "written")
        };
        for path in &self.report.files_written {
            writeln!(f, "{verb} {}", path.display())?;
        }
        for path in &self.report.files_skipped {
            writeln!(f, "kept {}", path.display())?;
        }
        let status = match self.status {
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
        };
        write!(
            f,
            "{status}: {} nodes, {} capabilities, {} files {done}, {} kept",
            self.report.nodes_visited,
            self.report.capabilities_run,
            self.report.files_written.len(),
            self.report.files_skipped.len()
        )
    }
}

/// Merge flags over the configuration file
fn effective_config(args: &GenerateArgs, config: &SkeinConfig) -> GenerationConfig {
    let mut effective = config.generation.clone();
    if let Some(out) = &args.out {
        effective = effective.with_output_root(out);
    }
    if let Some(policy) = args.overwrite {
        effective = effective.with_overwrite(policy);
    }
    if args.dry_run {
        effective = effective.with_dry_run(true);
    }
    effective
}

/// Load, reconstruct and generate
///
/// # Errors
/// Returns an error if loading, reconstruction or generation fails;
/// cancellation through `cancel` is reported as [`RunStatus::Cancelled`].
pub async fn run(
    args: &GenerateArgs,
    config: &SkeinConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<GenerateSummary> {
    let (_, tree) = load_tree(&args.state).await?;
    let generation = effective_config(args, config);

    let progress = |event: ProgressEvent| {
        tracing::debug!(
            node = %event.node,
            step = event.current_step,
            total = event.total_steps,
            "{}",
            event.message
        );
    };
    let outcome = Generator::new(&tree, generation.clone())
        .with_renderer(Arc::new(PlaceholderRenderer::new()))
        .generate(tree.root(), &progress, cancel)
        .await?;

    let (status, report) = match outcome {
        GenerationOutcome::Completed(report) => (RunStatus::Completed, report),
        GenerationOutcome::Cancelled(report) => (RunStatus::Cancelled, report),
    };
    Ok(GenerateSummary {
        status,
        config: generation,
        report,
    })
}

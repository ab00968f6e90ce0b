//! Command-line surface

use clap::{Args, Parser, Subcommand};
use skein_artifact::OverwritePolicy;
use std::path::PathBuf;

/// Materialise and inspect artifact workspaces
#[derive(Debug, Parser)]
#[command(name = "skein", version, about)]
pub struct Cli {
    /// Configuration file (default: ./skein.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, overrides the configuration (e.g. `debug`, `skein_artifact=trace`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconstruct a workspace and write its files
    Generate(GenerateArgs),
    /// Print the tree and its fingerprint
    Inspect(StateArgs),
    /// Check that a workspace reconstructs and round-trips
    Validate(StateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct StateArgs {
    /// Workspace state file (`.yaml`/`.yml` for YAML, otherwise JSON)
    pub state: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Workspace state file
    pub state: PathBuf,

    /// Output root (overrides `generation.output_root`)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Plan writes without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Policy for files that already exist
    #[arg(long, value_name = "overwrite|skip|fail")]
    pub overwrite: Option<OverwritePolicy>,
}

//! `skein.toml` configuration
//!
//! ```toml
//! [generation]
//! output_root = "out"
//! overwrite = "skip"
//! dry_run = false
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! Every key is optional; command-line flags win over the file.

use anyhow::Context;
use serde::Deserialize;
use skein_artifact::GenerationConfig;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "skein.toml";

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkeinConfig {
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SkeinConfig {
    /// Parse configuration text
    ///
    /// # Errors
    /// Returns an error for invalid TOML or unknown keys
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read a configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load `explicit`, else `./skein.toml` if present, else defaults
    ///
    /// # Errors
    /// Returns an error if a chosen file cannot be read or parsed
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(&fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

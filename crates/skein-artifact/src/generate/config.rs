//! Generation configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What to do when a target file already exists on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Replace the existing file
    #[default]
    Overwrite,

    /// Leave the existing file alone and record it as skipped
    Skip,

    /// Abort the run with `OutputExists`
    Fail,
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
            Self::Fail => "fail",
        })
    }
}

impl FromStr for OverwritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown overwrite policy: {other}")),
        }
    }
}

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Directory all outputs are resolved against
    pub output_root: PathBuf,

    /// Policy for pre-existing files
    pub overwrite: OverwritePolicy,

    /// Record planned outputs without touching the filesystem
    pub dry_run: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            overwrite: OverwritePolicy::default(),
            dry_run: false,
        }
    }
}

impl GenerationConfig {
    /// Create config writing under `output_root`
    #[inline]
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Set output root
    #[inline]
    #[must_use]
    pub fn with_output_root(mut self, output_root: impl AsRef<Path>) -> Self {
        self.output_root = output_root.as_ref().to_path_buf();
        self
    }

    /// Set overwrite policy
    #[inline]
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Enable or disable dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = GenerationConfig::new("/tmp/out")
            .with_overwrite(OverwritePolicy::Skip)
            .with_dry_run(true);
        assert_eq!(config.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(config.overwrite, OverwritePolicy::Skip);
        assert!(config.dry_run);
    }

    #[test]
    fn overwrite_policy_parse() {
        assert_eq!("SKIP".parse::<OverwritePolicy>().unwrap(), OverwritePolicy::Skip);
        assert!("sometimes".parse::<OverwritePolicy>().is_err());
        assert_eq!(OverwritePolicy::Fail.to_string(), "fail");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: GenerationConfig = serde_json::from_str(r#"{"dry_run": true}"#).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.overwrite, OverwritePolicy::Overwrite);
        assert_eq!(config.output_root, PathBuf::from("."));
    }
}

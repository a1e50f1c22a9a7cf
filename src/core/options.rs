//! core/options.rs
//!
//! Caller-facing configuration for reads, writes and the external FLAC tool.
//! All of it is plain data with serde derives so a host application can keep
//! it in its own config file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{MetaError, Result};
use super::fields::{Format, Id3v2Version};

/// How a unified write treats the formats other than the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStrategy {
    /// Write the target, then mirror the same map onto every other present format
    #[default]
    Sync,
    /// Snapshot the other formats, write the target, put the snapshots back
    Preserve,
    /// Remove every other format, then write the target
    Cleanup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Read only this format instead of the unified precedence scan
    pub format: Option<Format>,
    /// Caller rating scale (e.g. 10 or 100). `None` returns raw values.
    pub rating_max: Option<u32>,
    pub id3v2_version: Id3v2Version,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub strategy: Option<WriteStrategy>,
    /// Write this one format only, bypassing the strategies
    pub format: Option<Format>,
    pub rating_max: Option<u32>,
    pub id3v2_version: Id3v2Version,
    /// Abort instead of dropping fields the target format can't hold
    pub fail_on_unsupported_field: bool,
}

impl WriteOptions {
    /// Strategy and explicit format are mutually exclusive.
    pub fn validate(&self) -> Result<()> {
        if let (Some(strategy), Some(format)) = (self.strategy, self.format) {
            return Err(MetaError::ConflictingOptions(format!(
                "strategy {strategy:?} cannot be combined with explicit format {format}"
            )));
        }
        if self.rating_max == Some(0) {
            return Err(MetaError::ConflictingOptions(
                "rating_max must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where to find the `flac` executable and how long to let it run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlacToolConfig {
    /// Explicit path; `None` searches PATH
    pub binary: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for FlacToolConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_secs: 120,
        }
    }
}

impl FlacToolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolve_binary(&self) -> Result<PathBuf> {
        match &self.binary {
            Some(path) if path.exists() => Ok(path.clone()),
            Some(path) => Err(MetaError::ExternalTool(format!(
                "flac executable not found at {}",
                path.display()
            ))),
            None => which::which("flac")
                .map_err(|e| MetaError::ExternalTool(format!("flac executable not found: {e}"))),
        }
    }
}

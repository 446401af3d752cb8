//! Store configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk layout of a quad file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadFormat {
    /// One quad per line: `subject predicate object [label] [.]`, separated by
    /// tabs or spaces. Blank lines and `#` comments are ignored.
    #[default]
    Tsv,
    /// One JSON object per line: `{"subject", "predicate", "object", "label"?}`.
    JsonLines,
}

/// Configuration for opening a [`crate::MemStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Quads to load at open time. `None` opens an empty store.
    pub quads_path: Option<PathBuf>,
    pub format: QuadFormat,
    /// Warn and skip malformed lines instead of failing the load.
    pub skip_malformed: bool,
    /// Label applied to quads that do not carry one.
    pub default_label: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            quads_path: None,
            format: QuadFormat::Tsv,
            skip_malformed: false,
            default_label: None,
        }
    }
}

impl StoreConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading store config {}", path.display()))?;
        let config: StoreConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing store config {}", path.display()))?;
        Ok(config)
    }

    pub fn with_quads(mut self, path: impl Into<PathBuf>, format: QuadFormat) -> Self {
        self.quads_path = Some(path.into());
        self.format = format;
        self
    }
}

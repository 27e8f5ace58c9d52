//! # Configuration
//!
//! Diarch configuration is loaded with [`confique`] from, in priority order:
//!
//! 1. **Environment variables**: `DIARCH_DATA`, `DIARCH_LAYOUT`, ...
//! 2. **Config file**: `$DIARCH_CONFIG`, or `diarch.toml` in the OS config
//!    directory (via the `directories` crate).
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! The CLI's `--data` flag is applied on top of all of these.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `data_dir` | `DIARCH_DATA` | OS data dir | Record store location |
//! | `legacy_file` | `DIARCH_LEGACY_FILE` | `<data_dir>/diaries.json` | Legacy flat list |
//! | `layout` | `DIARCH_LAYOUT` | `grid` | Default catalog layout |
//! | `chart_width` | `DIARCH_CHART_WIDTH` | `40` | Longest bar in `stats` |
//! | `quota_mb` | `DIARCH_QUOTA_MB` | none | Cap on the reported quota |
//! | `quota_check` | `DIARCH_QUOTA_CHECK` | `true` | Probe disk space before uploads |

use crate::catalog::Layout;
use crate::error::{DiarchError, Result};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "diarch.toml";

/// Configuration for diarch, stored in `diarch.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DiarchConfig {
    /// Directory holding the record store.
    #[config(env = "DIARCH_DATA")]
    pub data_dir: Option<PathBuf>,

    /// Legacy flat list to migrate from. Defaults to `diaries.json` in the data dir.
    #[config(env = "DIARCH_LEGACY_FILE")]
    pub legacy_file: Option<PathBuf>,

    /// "grid" or "list"
    #[config(env = "DIARCH_LAYOUT", default = "grid")]
    pub layout: String,

    #[config(env = "DIARCH_CHART_WIDTH", default = 40)]
    pub chart_width: usize,

    #[config(env = "DIARCH_QUOTA_MB")]
    pub quota_mb: Option<u64>,

    #[config(env = "DIARCH_QUOTA_CHECK", default = true)]
    pub quota_check: bool,
}

impl Default for DiarchConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            legacy_file: None,
            layout: "grid".to_string(),
            chart_width: 40,
            quota_mb: None,
            quota_check: true,
        }
    }
}

impl DiarchConfig {
    /// Load from the environment and an optional config file. A missing file is fine.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        builder
            .load()
            .map_err(|e| DiarchError::Config(e.to_string()))
    }

    pub fn layout(&self) -> Result<Layout> {
        self.layout.parse()
    }

    /// Chart width, never zero.
    pub fn chart_width(&self) -> usize {
        self.chart_width.max(1)
    }

    /// Data directory, falling back to `default` when not configured.
    pub fn data_dir(&self, default: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| default.to_path_buf())
    }
}

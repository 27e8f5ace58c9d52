//! # Command Layer
//!
//! Business logic for every user-facing operation. Commands take a store
//! and/or the [`CatalogState`](crate::state::CatalogState), plain arguments,
//! and return a [`CmdResult`]. They never print.
//!
//! Mutations go through [`dispatch::run`]: the reducer decides, the
//! dispatcher carries the resulting effects out against the store.

use crate::catalog::{CatalogStats, CatalogView};
use crate::index::DisplayRecord;
use crate::model::Record;
use crate::quota::QuotaEstimate;
use crate::store::DoctorReport;
use std::path::PathBuf;

pub mod delete;
pub mod dispatch;
pub mod doctor;
pub mod download;
pub mod helpers;
pub mod list;
pub mod migrate;
pub mod stats;
pub mod storage;
pub mod upload;

pub use migrate::MigrationReport;
pub use storage::StorageReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_records: Vec<Record>,
    pub listed_records: Vec<DisplayRecord>,
    pub view: Option<CatalogView>,
    pub stats: Option<CatalogStats>,
    pub storage: Option<StorageReport>,
    pub migration: Option<MigrationReport>,
    pub doctor: Option<DoctorReport>,
    pub paths: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_view(mut self, view: CatalogView) -> Self {
        self.listed_records = view.records.clone();
        self.view = Some(view);
        self
    }

    pub fn with_stats(mut self, stats: CatalogStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }
}

/// "Storage used: X MB / Y MB", the line shown after uploads and in `storage`.
pub fn usage_line(estimate: &QuotaEstimate) -> String {
    format!(
        "Storage used: {:.2} MB / {:.2} MB",
        estimate.usage_mb(),
        estimate.quota_mb()
    )
}

//! Storage quota estimation.
//!
//! The upload check wants "how many more bytes can the store take". On a
//! local disk that is the free space of the filesystem holding the data
//! directory, optionally capped by configuration. A probe may not know at
//! all, in which case the check is skipped.

use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::debug;

const MB: u64 = 1024 * 1024;

/// Usage and quota in bytes, as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaEstimate {
    pub usage: u64,
    pub quota: u64,
}

impl QuotaEstimate {
    pub fn available(&self) -> u64 {
        self.quota.saturating_sub(self.usage)
    }

    pub fn usage_mb(&self) -> f64 {
        self.usage as f64 / MB as f64
    }

    pub fn quota_mb(&self) -> f64 {
        self.quota as f64 / MB as f64
    }
}

pub trait QuotaProbe {
    /// Estimate the quota given the bytes the store already uses.
    /// `None` when the platform cannot tell.
    fn estimate(&self, usage: u64) -> Option<QuotaEstimate>;
}

/// Free space of the disk holding `path`, plus what the store already uses.
pub struct DiskQuota {
    path: PathBuf,
    cap: Option<u64>,
}

impl DiskQuota {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cap: None,
        }
    }

    /// Never report more than `mb` megabytes of quota.
    pub fn with_cap_mb(mut self, mb: Option<u64>) -> Self {
        self.cap = mb.map(|mb| mb.saturating_mul(MB));
        self
    }

    fn free_space(&self) -> Option<u64> {
        let target = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());
        let disks = Disks::new_with_refreshed_list();
        disks
            .iter()
            .filter(|disk| target.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
    }
}

impl QuotaProbe for DiskQuota {
    fn estimate(&self, usage: u64) -> Option<QuotaEstimate> {
        let quota = match (self.free_space(), self.cap) {
            (Some(free), Some(cap)) => (usage + free).min(cap),
            (Some(free), None) => usage + free,
            (None, Some(cap)) => cap,
            (None, None) => {
                debug!(path = %self.path.display(), "no disk found for data directory");
                return None;
            }
        };
        Some(QuotaEstimate { usage, quota })
    }
}

/// A fixed quota in bytes.
pub struct FixedQuota(pub u64);

impl QuotaProbe for FixedQuota {
    fn estimate(&self, usage: u64) -> Option<QuotaEstimate> {
        Some(QuotaEstimate {
            usage,
            quota: self.0,
        })
    }
}

/// The platform reports nothing; quota checks are skipped.
pub struct NoQuota;

impl QuotaProbe for NoQuota {
    fn estimate(&self, _usage: u64) -> Option<QuotaEstimate> {
        None
    }
}

/// Pick the probe for a data directory from config values.
pub fn probe_for(path: &Path, enabled: bool, cap_mb: Option<u64>) -> Box<dyn QuotaProbe> {
    if enabled {
        Box::new(DiskQuota::new(path).with_cap_mb(cap_mb))
    } else {
        Box::new(NoQuota)
    }
}

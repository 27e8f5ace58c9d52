//! # Storage Layer
//!
//! The Record Store: durable keyed storage of [`Record`]s that survives process
//! restarts. The application talks to it through the [`DataStore`] trait.
//!
//! ## Store / Backend split
//!
//! - [`record_store::RecordStore`] holds the logic: the open handle, schema
//!   versioning, duplicate-key checks, secondary indexes and the consistency
//!   check.
//! - [`backend::StorageBackend`] is raw I/O only. [`fs_backend::FsBackend`] is
//!   the production implementation, [`mem_backend::MemBackend`] keeps
//!   everything in memory for tests.
//!
//! ## Opening
//!
//! A store starts closed. [`DataStore::initialize`] opens it (creating the
//! layout when absent), checks the schema version and builds the secondary
//! indexes on `category` and `date`. The legacy migration keys off
//! [`DataStore::is_open`]: it only runs for a store that was not yet open in
//! this session.
//!
//! ## Write ordering
//!
//! - `add` writes the payload first, then the index. A crash in between leaves
//!   an orphan payload, never an index entry pointing at nothing.
//! - `remove` drops the index entry first, then the payload.
//!
//! `doctor` cleans up whatever an interrupted write leaves behind.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── schema.json        # store name, schema version, secondary indexes
//! ├── index.json         # RecordMeta for every record, keyed by id
//! ├── record-<id>.b64    # data URL payload per record
//! └── diaries.json       # legacy flat list (until migrated)
//! ```

use crate::error::Result;
use crate::model::{Record, RecordId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod record_store;

pub use record_store::RecordStore;

/// Deterministic name of the record store.
pub const STORE_NAME: &str = "diaries";

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Secondary lookup paths maintained by the store (non-unique).
pub const SECONDARY_INDEXES: [&str; 2] = ["category", "date"];

pub type FileStore = RecordStore<fs_backend::FsBackend>;
pub type InMemoryStore = RecordStore<mem_backend::MemBackend>;

/// Persisted description of the store (`schema.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub name: String,
    pub version: u32,
    pub indexes: Vec<String>,
}

impl SchemaInfo {
    pub fn current() -> Self {
        Self {
            name: STORE_NAME.to_string(),
            version: SCHEMA_VERSION,
            indexes: SECONDARY_INDEXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Report from the `doctor` operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    /// Index entries dropped because their payload was gone.
    pub removed_missing_payloads: usize,
    /// Payloads deleted because no index entry referenced them.
    pub removed_orphan_payloads: usize,
    /// Records whose payload does not match their size or type (kept).
    pub invalid_payloads: Vec<RecordId>,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.removed_missing_payloads == 0
            && self.removed_orphan_payloads == 0
            && self.invalid_payloads.is_empty()
    }
}

/// Abstract interface for record storage.
pub trait DataStore {
    /// Open the store, creating it when absent. Idempotent.
    fn initialize(&mut self) -> Result<()>;

    /// Whether `initialize` already succeeded on this handle.
    fn is_open(&self) -> bool;

    /// Insert a new record. Fails with `DuplicateKey` if the id exists.
    fn add(&mut self, record: &Record) -> Result<()>;

    /// Get one record by id.
    fn get(&self, id: &RecordId) -> Result<Record>;

    /// Every stored record, in no particular order.
    fn list_all(&self) -> Result<Vec<Record>>;

    /// Delete a record. Absent ids are a no-op.
    fn remove(&mut self, id: &RecordId) -> Result<()>;

    /// Records in a category (secondary index).
    fn find_by_category(&self, category: &str) -> Result<Vec<Record>>;

    /// Records dated on a given day (secondary index).
    fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Record>>;

    /// Raw contents of the legacy flat list, if any. Works on a closed store.
    fn read_legacy(&self) -> Result<Option<String>>;

    /// Remove the legacy flat list.
    fn clear_legacy(&mut self) -> Result<()>;

    /// Bytes currently used by the store.
    fn usage_bytes(&self) -> Result<u64>;

    /// Where the store lives (a real directory, or a virtual path).
    fn location(&self) -> PathBuf;

    /// Verify and fix consistency issues
    fn doctor(&mut self) -> Result<DoctorReport>;
}

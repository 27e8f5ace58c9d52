use super::SchemaInfo;
use crate::error::Result;
use crate::model::{RecordId, RecordMeta};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Record index as persisted: metadata keyed by id.
pub type RecordIndex = BTreeMap<RecordId, RecordMeta>;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while RecordStore handles the "what" (keys, schema, indexes, doctor).
pub trait StorageBackend {
    /// Check that persistent storage can actually be used.
    /// Fails with `StorageUnavailable` when it cannot.
    fn probe(&self) -> Result<()>;

    // --- Schema ---

    fn load_schema(&self) -> Result<Option<SchemaInfo>>;

    fn save_schema(&self, schema: &SchemaInfo) -> Result<()>;

    // --- Index ---

    /// Load the metadata index. A missing index is an empty one.
    fn load_index(&self) -> Result<RecordIndex>;

    /// Save the metadata index. MUST be atomic.
    fn save_index(&self, index: &RecordIndex) -> Result<()>;

    // --- Payloads ---

    /// Returns Ok(None) if the payload does not exist.
    fn read_payload(&self, id: &RecordId) -> Result<Option<String>>;

    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_payload(&self, id: &RecordId, payload: &str) -> Result<()>;

    /// Deleting a missing payload is not an error.
    fn delete_payload(&self, id: &RecordId) -> Result<()>;

    /// Ids of all payloads present (for consistency checks).
    fn list_payload_ids(&self) -> Result<Vec<RecordId>>;

    // --- Legacy flat list ---

    fn read_legacy(&self) -> Result<Option<String>>;

    fn clear_legacy(&self) -> Result<()>;

    // --- Capabilities ---

    fn usage_bytes(&self) -> Result<u64>;

    fn location(&self) -> PathBuf;
}

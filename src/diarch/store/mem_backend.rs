use super::backend::{RecordIndex, StorageBackend};
use super::SchemaInfo;
use crate::error::{DiarchError, Result};
use crate::model::RecordId;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since diarch is single-threaded.
/// This avoids the overhead of `RwLock` while still allowing the
/// `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    schema: RefCell<Option<SchemaInfo>>,
    index: RefCell<RecordIndex>,
    payloads: RefCell<BTreeMap<RecordId, String>>,
    legacy: RefCell<Option<String>>,
    simulate_write_error: RefCell<bool>,
    unavailable: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the legacy flat list.
    pub fn with_legacy(self, raw: impl Into<String>) -> Self {
        *self.legacy.borrow_mut() = Some(raw.into());
        self
    }

    /// Put a legacy flat list back, as if an old version wrote it again.
    pub fn set_legacy(&self, raw: impl Into<String>) {
        *self.legacy.borrow_mut() = Some(raw.into());
    }

    /// Make `probe` fail, as if the platform denied persistent storage.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.borrow_mut() = unavailable;
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    pub fn legacy(&self) -> Option<String> {
        self.legacy.borrow().clone()
    }

    fn check_write(&self) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(DiarchError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn probe(&self) -> Result<()> {
        if *self.unavailable.borrow() {
            return Err(DiarchError::StorageUnavailable(
                "simulated: storage denied".to_string(),
            ));
        }
        Ok(())
    }

    fn load_schema(&self) -> Result<Option<SchemaInfo>> {
        Ok(self.schema.borrow().clone())
    }

    fn save_schema(&self, schema: &SchemaInfo) -> Result<()> {
        self.check_write()?;
        *self.schema.borrow_mut() = Some(schema.clone());
        Ok(())
    }

    fn load_index(&self) -> Result<RecordIndex> {
        Ok(self.index.borrow().clone())
    }

    fn save_index(&self, index: &RecordIndex) -> Result<()> {
        self.check_write()?;
        *self.index.borrow_mut() = index.clone();
        Ok(())
    }

    fn read_payload(&self, id: &RecordId) -> Result<Option<String>> {
        Ok(self.payloads.borrow().get(id).cloned())
    }

    fn write_payload(&self, id: &RecordId, payload: &str) -> Result<()> {
        self.check_write()?;
        self.payloads
            .borrow_mut()
            .insert(id.clone(), payload.to_string());
        Ok(())
    }

    fn delete_payload(&self, id: &RecordId) -> Result<()> {
        self.payloads.borrow_mut().remove(id);
        Ok(())
    }

    fn list_payload_ids(&self) -> Result<Vec<RecordId>> {
        Ok(self.payloads.borrow().keys().cloned().collect())
    }

    fn read_legacy(&self) -> Result<Option<String>> {
        Ok(self.legacy.borrow().clone())
    }

    fn clear_legacy(&self) -> Result<()> {
        self.check_write()?;
        *self.legacy.borrow_mut() = None;
        Ok(())
    }

    fn usage_bytes(&self) -> Result<u64> {
        let payloads: usize = self.payloads.borrow().values().map(|p| p.len()).sum();
        let legacy = self.legacy.borrow().as_ref().map_or(0, |l| l.len());
        Ok((payloads + legacy) as u64)
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory://diaries")
    }
}

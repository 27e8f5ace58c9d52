use super::backend::{RecordIndex, StorageBackend};
use super::{DataStore, DoctorReport, SchemaInfo, SCHEMA_VERSION};
use crate::encoding::DataUrl;
use crate::error::{DiarchError, Result};
use crate::model::{Record, RecordId, RecordMeta};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// State that only exists once `initialize` succeeded.
struct OpenHandle {
    schema: SchemaInfo,
    by_category: BTreeMap<String, BTreeSet<RecordId>>,
    by_date: BTreeMap<NaiveDate, BTreeSet<RecordId>>,
}

impl OpenHandle {
    fn new(schema: SchemaInfo, index: &RecordIndex) -> Self {
        let mut handle = Self {
            schema,
            by_category: BTreeMap::new(),
            by_date: BTreeMap::new(),
        };
        for meta in index.values() {
            handle.insert(meta);
        }
        handle
    }

    fn insert(&mut self, meta: &RecordMeta) {
        self.by_category
            .entry(meta.category.clone())
            .or_default()
            .insert(meta.id.clone());
        self.by_date
            .entry(meta.date)
            .or_default()
            .insert(meta.id.clone());
    }

    fn remove(&mut self, meta: &RecordMeta) {
        if let Some(ids) = self.by_category.get_mut(&meta.category) {
            ids.remove(&meta.id);
            if ids.is_empty() {
                self.by_category.remove(&meta.category);
            }
        }
        if let Some(ids) = self.by_date.get_mut(&meta.date) {
            ids.remove(&meta.id);
            if ids.is_empty() {
                self.by_date.remove(&meta.date);
            }
        }
    }
}

pub struct RecordStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    handle: Option<OpenHandle>,
}

impl<B: StorageBackend> RecordStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            handle: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Schema of the open store.
    pub fn schema(&self) -> Option<&SchemaInfo> {
        self.handle.as_ref().map(|h| &h.schema)
    }

    fn handle(&self) -> Result<&OpenHandle> {
        self.handle
            .as_ref()
            .ok_or_else(|| DiarchError::Store("store is not initialized".to_string()))
    }

    fn handle_mut(&mut self) -> Result<&mut OpenHandle> {
        self.handle
            .as_mut()
            .ok_or_else(|| DiarchError::Store("store is not initialized".to_string()))
    }

    fn open_schema(&self) -> Result<SchemaInfo> {
        let current = SchemaInfo::current();
        match self.backend.load_schema()? {
            None => {
                debug!(name = %current.name, version = current.version, "creating store");
                self.backend.save_schema(&current)?;
                Ok(current)
            }
            Some(found) if found.version > SCHEMA_VERSION => Err(DiarchError::Store(format!(
                "store schema version {} is newer than supported version {}",
                found.version, SCHEMA_VERSION
            ))),
            Some(found) if found != current => {
                info!(from = found.version, to = SCHEMA_VERSION, "upgrading store schema");
                self.backend.save_schema(&current)?;
                Ok(current)
            }
            Some(found) => Ok(found),
        }
    }

    fn load_record(&self, meta: RecordMeta) -> Result<Option<Record>> {
        Ok(self
            .backend
            .read_payload(&meta.id)?
            .map(|payload| Record::from_parts(meta, payload)))
    }

    fn records_for(&self, ids: Option<&BTreeSet<RecordId>>) -> Result<Vec<Record>> {
        let Some(ids) = ids else {
            return Ok(Vec::new());
        };
        let index = self.backend.load_index()?;
        let mut records = Vec::new();
        for id in ids {
            if let Some(meta) = index.get(id) {
                if let Some(record) = self.load_record(meta.clone())? {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}

impl<B: StorageBackend> DataStore for RecordStore<B> {
    fn initialize(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        self.backend.probe()?;
        let schema = self.open_schema()?;
        let index = self.backend.load_index()?;
        debug!(records = index.len(), location = %self.backend.location().display(), "store opened");
        self.handle = Some(OpenHandle::new(schema, &index));
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn add(&mut self, record: &Record) -> Result<()> {
        self.handle()?;
        let mut index = self.backend.load_index()?;
        if index.contains_key(&record.id) {
            return Err(DiarchError::DuplicateKey(record.id.clone()));
        }

        // 1. Payload first: a crash here leaves an orphan, not a dangling entry
        self.backend.write_payload(&record.id, &record.encoded_file)?;

        // 2. Index
        let meta = record.metadata();
        index.insert(record.id.clone(), meta.clone());
        self.backend.save_index(&index)?;

        self.handle_mut()?.insert(&meta);
        debug!(id = %record.id, "record added");
        Ok(())
    }

    fn get(&self, id: &RecordId) -> Result<Record> {
        self.handle()?;
        let index = self.backend.load_index()?;
        let meta = index
            .get(id)
            .cloned()
            .ok_or_else(|| DiarchError::RecordNotFound(id.clone()))?;
        self.load_record(meta)?
            .ok_or_else(|| DiarchError::RecordNotFound(id.clone()))
    }

    fn list_all(&self) -> Result<Vec<Record>> {
        self.handle()?;
        let index = self.backend.load_index()?;
        let mut records = Vec::with_capacity(index.len());
        for (id, meta) in index {
            match self.load_record(meta)? {
                Some(record) => records.push(record),
                None => warn!(id = %id, "payload missing, skipping record (run doctor)"),
            }
        }
        Ok(records)
    }

    fn remove(&mut self, id: &RecordId) -> Result<()> {
        self.handle()?;
        let mut index = self.backend.load_index()?;
        let Some(meta) = index.remove(id) else {
            debug!(id = %id, "remove: no such record");
            return Ok(());
        };

        // 1. Index first, 2. payload
        self.backend.save_index(&index)?;
        self.backend.delete_payload(id)?;

        self.handle_mut()?.remove(&meta);
        debug!(id = %id, "record removed");
        Ok(())
    }

    fn find_by_category(&self, category: &str) -> Result<Vec<Record>> {
        let handle = self.handle()?;
        self.records_for(handle.by_category.get(category))
    }

    fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Record>> {
        let handle = self.handle()?;
        self.records_for(handle.by_date.get(&date))
    }

    fn read_legacy(&self) -> Result<Option<String>> {
        self.backend.read_legacy()
    }

    fn clear_legacy(&mut self) -> Result<()> {
        self.backend.clear_legacy()
    }

    fn usage_bytes(&self) -> Result<u64> {
        self.backend.usage_bytes()
    }

    fn location(&self) -> PathBuf {
        self.backend.location()
    }

    fn doctor(&mut self) -> Result<DoctorReport> {
        self.handle()?;
        let mut index = self.backend.load_index()?;
        let payload_ids: BTreeSet<RecordId> =
            self.backend.list_payload_ids()?.into_iter().collect();
        let mut report = DoctorReport::default();

        // 1. Index entries without a payload
        let zombies: Vec<RecordId> = index
            .keys()
            .filter(|id| !payload_ids.contains(*id))
            .cloned()
            .collect();
        for id in &zombies {
            index.remove(id);
            report.removed_missing_payloads += 1;
        }
        if !zombies.is_empty() {
            self.backend.save_index(&index)?;
        }

        // 2. Payloads nobody references
        for id in payload_ids.iter().filter(|id| !index.contains_key(*id)) {
            self.backend.delete_payload(id)?;
            report.removed_orphan_payloads += 1;
        }

        // 3. Payloads that disagree with their metadata (reported only)
        for (id, meta) in &index {
            let Some(payload) = self.backend.read_payload(id)? else {
                continue;
            };
            let consistent = DataUrl::parse(&payload)
                .map(|url| {
                    url.media_type() == meta.file_type && url.decoded_len() == Some(meta.file_size)
                })
                .unwrap_or(false);
            if !consistent {
                report.invalid_payloads.push(id.clone());
            }
        }

        if let Some(handle) = self.handle.as_mut() {
            let schema = handle.schema.clone();
            *handle = OpenHandle::new(schema, &index);
        }

        if !report.is_clean() {
            info!(
                missing = report.removed_missing_payloads,
                orphans = report.removed_orphan_payloads,
                invalid = report.invalid_payloads.len(),
                "doctor repaired store"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DOCUMENT_MEDIA_TYPE;
    use crate::store::mem_backend::MemBackend;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use chrono::Utc;

    fn make_store() -> RecordStore<MemBackend> {
        let mut store = RecordStore::with_backend(MemBackend::new());
        store.initialize().unwrap();
        store
    }

    fn record(id: &str, category: &str, date: &str) -> Record {
        let bytes = b"%PDF-1.4 test";
        Record {
            id: RecordId::parse(id).unwrap(),
            title: format!("Doc {}", id),
            category: category.to_string(),
            date: crate::model::parse_date(date).unwrap(),
            encoded_file: format!("data:application/pdf;base64,{}", STANDARD.encode(bytes)),
            file_name: format!("{}.pdf", id),
            file_type: DOCUMENT_MEDIA_TYPE.to_string(),
            file_size: bytes.len() as u64,
            upload_timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_operations_require_initialize() {
        let store = RecordStore::with_backend(MemBackend::new());
        assert!(!store.is_open());
        assert!(matches!(store.list_all(), Err(DiarchError::Store(_))));
    }

    #[test]
    fn test_initialize_creates_schema_and_is_idempotent() {
        let mut store = make_store();
        assert!(store.is_open());
        assert_eq!(store.backend.load_schema().unwrap(), Some(SchemaInfo::current()));
        store.initialize().unwrap();
        assert_eq!(store.schema(), Some(&SchemaInfo::current()));
    }

    #[test]
    fn test_initialize_fails_when_storage_unavailable() {
        let backend = MemBackend::new();
        backend.set_unavailable(true);
        let mut store = RecordStore::with_backend(backend);
        assert!(matches!(
            store.initialize(),
            Err(DiarchError::StorageUnavailable(_))
        ));
        assert!(!store.is_open());
    }

    #[test]
    fn test_newer_schema_is_rejected_and_older_upgraded() {
        let backend = MemBackend::new();
        let mut newer = SchemaInfo::current();
        newer.version = SCHEMA_VERSION + 1;
        backend.save_schema(&newer).unwrap();
        let mut store = RecordStore::with_backend(backend);
        assert!(matches!(store.initialize(), Err(DiarchError::Store(_))));

        let backend = MemBackend::new();
        let mut older = SchemaInfo::current();
        older.version = 0;
        older.indexes.clear();
        backend.save_schema(&older).unwrap();
        let mut store = RecordStore::with_backend(backend);
        store.initialize().unwrap();
        assert_eq!(store.backend.load_schema().unwrap(), Some(SchemaInfo::current()));
    }

    #[test]
    fn test_add_get_list() {
        let mut store = make_store();
        let r = record("1", "Travel", "2023-05-01");
        store.add(&r).unwrap();

        assert_eq!(store.get(&r.id).unwrap(), r);
        assert_eq!(store.list_all().unwrap(), vec![r]);
    }

    #[test]
    fn test_add_duplicate_key() {
        let mut store = make_store();
        let r = record("1", "Travel", "2023-05-01");
        store.add(&r).unwrap();
        let err = store.add(&r).unwrap_err();
        assert!(matches!(err, DiarchError::DuplicateKey(id) if id == r.id));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = make_store();
        store.add(&record("1", "Travel", "2023-05-01")).unwrap();
        store.remove(&RecordId::parse("999").unwrap()).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_deletes_payload_and_index() {
        let mut store = make_store();
        let r = record("1", "Travel", "2023-05-01");
        store.add(&r).unwrap();
        store.remove(&r.id).unwrap();

        assert!(store.list_all().unwrap().is_empty());
        assert!(store.backend.read_payload(&r.id).unwrap().is_none());
        assert!(store.find_by_category("Travel").unwrap().is_empty());
    }

    #[test]
    fn test_failed_index_write_leaves_no_entry() {
        let mut store = make_store();
        store.backend.set_simulate_write_error(true);
        assert!(store.add(&record("1", "Travel", "2023-05-01")).is_err());
        store.backend.set_simulate_write_error(false);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_secondary_indexes() {
        let mut store = make_store();
        store.add(&record("1", "Travel", "2023-05-01")).unwrap();
        store.add(&record("2", "Work", "2023-05-01")).unwrap();
        store.add(&record("3", "Travel", "2022-01-10")).unwrap();

        let travel = store.find_by_category("Travel").unwrap();
        assert_eq!(travel.len(), 2);
        assert!(travel.iter().all(|r| r.category == "Travel"));

        let day = store
            .find_by_date(crate::model::parse_date("2023-05-01").unwrap())
            .unwrap();
        assert_eq!(day.len(), 2);
        assert!(store.find_by_category("Nope").unwrap().is_empty());
    }

    #[test]
    fn test_secondary_indexes_rebuilt_on_open() {
        let backend = MemBackend::new();
        let mut store = RecordStore::with_backend(backend);
        store.initialize().unwrap();
        store.add(&record("1", "Travel", "2023-05-01")).unwrap();

        let mut reopened = RecordStore::with_backend(store.backend);
        reopened.initialize().unwrap();
        assert_eq!(reopened.find_by_category("Travel").unwrap().len(), 1);
    }

    #[test]
    fn test_doctor_removes_zombie_entries() {
        let mut store = make_store();
        let r = record("1", "Travel", "2023-05-01");
        store.add(&r).unwrap();
        store.backend.delete_payload(&r.id).unwrap();

        // list_all skips it even before repair
        assert!(store.list_all().unwrap().is_empty());

        let report = store.doctor().unwrap();
        assert_eq!(report.removed_missing_payloads, 1);
        assert!(store.backend.load_index().unwrap().is_empty());
        assert!(store.find_by_category("Travel").unwrap().is_empty());
    }

    #[test]
    fn test_doctor_removes_orphan_payloads() {
        let mut store = make_store();
        let orphan = RecordId::parse("orphan").unwrap();
        store
            .backend
            .write_payload(&orphan, "data:application/pdf;base64,")
            .unwrap();

        let report = store.doctor().unwrap();
        assert_eq!(report.removed_orphan_payloads, 1);
        assert!(store.backend.read_payload(&orphan).unwrap().is_none());
    }

    #[test]
    fn test_doctor_reports_invalid_payloads() {
        let mut store = make_store();
        let mut r = record("1", "Travel", "2023-05-01");
        r.file_size += 10;
        store.add(&r).unwrap();
        store.add(&record("2", "Work", "2023-05-02")).unwrap();

        let report = store.doctor().unwrap();
        assert_eq!(report.invalid_payloads, vec![r.id.clone()]);
        // Reported, not removed
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_doctor_clean_store() {
        let mut store = make_store();
        store.add(&record("1", "Travel", "2023-05-01")).unwrap();
        assert!(store.doctor().unwrap().is_clean());
    }

    #[test]
    fn test_legacy_accessors_work_before_initialize() {
        let mut store = RecordStore::with_backend(MemBackend::new().with_legacy("[]"));
        assert_eq!(store.read_legacy().unwrap().as_deref(), Some("[]"));
        store.clear_legacy().unwrap();
        assert!(store.read_legacy().unwrap().is_none());
    }
}

//! # API Facade
//!
//! [`DiarchApi`] is the single owning controller: it holds the store, the
//! [`CatalogState`] and the quota probe, and every UI talks to it.
//!
//! ## Opening a session
//!
//! [`DiarchApi::open`] initializes the store, runs the legacy migration if
//! this handle was not open before, and loads the catalog.
//!
//! When the store reports `StorageUnavailable` the session still opens, in
//! degraded mode: the catalog is loaded read-only from the legacy list, a
//! notice is queued, and every mutation fails with `StorageUnavailable`.
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: that belongs in `commands/*.rs`
//! - **I/O to the terminal**: no stdout, stderr, or exit codes
//!
//! ## Generic Over DataStore
//!
//! - Production: `DiarchApi<FileStore>`
//! - Testing: `DiarchApi<InMemoryStore>`

use crate::catalog::{CatalogFilter, Layout};
use crate::commands::{self, CmdMessage, CmdResult, MigrationReport};
use crate::error::{DiarchError, Result};
use crate::index::RecordSelector;
use crate::model::Record;
use crate::quota::QuotaProbe;
use crate::state::{reduce, Action, CatalogState};
use crate::store::DataStore;
use std::path::Path;
use tracing::warn;

pub struct DiarchApi<S: DataStore> {
    store: S,
    state: CatalogState,
    quota: Box<dyn QuotaProbe>,
    persistent: bool,
    migration: Option<MigrationReport>,
    notices: Vec<CmdMessage>,
}

impl<S: DataStore> DiarchApi<S> {
    /// Open a session over `store`.
    pub fn open(store: S, quota: Box<dyn QuotaProbe>, layout: Layout) -> Result<Self> {
        let mut api = Self {
            store,
            state: CatalogState::new(layout),
            quota,
            persistent: false,
            migration: None,
            notices: Vec::new(),
        };
        api.start()?;
        Ok(api)
    }

    fn start(&mut self) -> Result<()> {
        let fresh = !self.store.is_open();
        match self.store.initialize() {
            Ok(()) => {
                self.persistent = true;
                if fresh {
                    self.run_migration();
                }
                self.reload()
            }
            Err(DiarchError::StorageUnavailable(reason)) => {
                warn!(reason = %reason, "persistent storage unavailable, using legacy list read-only");
                self.persistent = false;
                self.notices.push(CmdMessage::warning(format!(
                    "Persistent storage is unavailable ({}). Changes cannot be saved.",
                    reason
                )));
                let records = match self.store.read_legacy() {
                    Ok(Some(raw)) => commands::migrate::parse_legacy(&raw).unwrap_or_else(|e| {
                        warn!(error = %e, "legacy list unreadable");
                        Vec::new()
                    }),
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        warn!(error = %e, "legacy list unreadable");
                        Vec::new()
                    }
                };
                self.load(records);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn run_migration(&mut self) {
        match commands::migrate::run(&mut self.store) {
            Ok(report) => {
                if report.migrated > 0 {
                    self.notices.push(CmdMessage::info(format!(
                        "Migrated {} legacy diaries.",
                        report.migrated
                    )));
                }
                if report.abandoned {
                    self.notices.push(CmdMessage::warning(
                        "The legacy diary list could not be read; it was left untouched.",
                    ));
                }
                self.migration = Some(report);
            }
            Err(e) => {
                warn!(error = %e, "legacy migration aborted");
                self.notices.push(CmdMessage::warning(format!(
                    "Legacy migration failed: {}",
                    e
                )));
            }
        }
    }

    fn load(&mut self, records: Vec<Record>) {
        self.state = reduce(std::mem::take(&mut self.state), Action::Loaded(records)).state;
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.persistent {
            Ok(())
        } else {
            Err(DiarchError::StorageUnavailable(
                "running on the read-only legacy list".to_string(),
            ))
        }
    }

    /// Re-read every record from the store.
    pub fn reload(&mut self) -> Result<()> {
        let records = self.store.list_all()?;
        self.load(records);
        Ok(())
    }

    /// Messages produced while opening (migration, degraded mode). Drained.
    pub fn take_notices(&mut self) -> Vec<CmdMessage> {
        std::mem::take(&mut self.notices)
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn upload(
        &mut self,
        form: &commands::upload::UploadForm,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<CmdResult> {
        self.ensure_writable()?;
        commands::upload::run(
            &mut self.store,
            &mut self.state,
            form,
            self.quota.as_ref(),
            on_progress,
        )
    }

    pub fn list(&mut self, filter: CatalogFilter, layout: Option<Layout>) -> Result<CmdResult> {
        commands::list::run(&mut self.state, filter, layout)
    }

    pub fn stats(&self) -> Result<CmdResult> {
        commands::stats::run(&self.state)
    }

    /// Resolve selectors against the current catalog without changing anything.
    pub fn select<I: AsRef<str>>(&self, selectors: &[I]) -> Result<CmdResult> {
        let parsed = parse_selectors(selectors)?;
        let selected = commands::helpers::select(&self.state, &parsed)?;
        Ok(CmdResult {
            listed_records: selected,
            ..Default::default()
        })
    }

    pub fn delete<I: AsRef<str>>(&mut self, selectors: &[I], confirmed: bool) -> Result<CmdResult> {
        self.ensure_writable()?;
        let parsed = parse_selectors(selectors)?;
        commands::delete::run(&mut self.store, &mut self.state, &parsed, confirmed)
    }

    pub fn view(&self, selector: &str, temp_dir: &Path) -> Result<CmdResult> {
        let parsed = parse_selector(selector)?;
        commands::download::view(&self.state, &parsed, temp_dir)
    }

    pub fn download(&self, selector: &str, output: Option<&Path>, cwd: &Path) -> Result<CmdResult> {
        let parsed = parse_selector(selector)?;
        commands::download::run(&self.state, &parsed, output, cwd)
    }

    pub fn storage(&self) -> Result<CmdResult> {
        commands::storage::run(&self.store, self.quota.as_ref(), self.persistent)
    }

    /// Report of this session's migration, retrying if a legacy list is still present.
    ///
    /// A retry that hits a storage error fails the call; the legacy list stays.
    pub fn migrate(&mut self) -> Result<CmdResult> {
        self.ensure_writable()?;
        if self.store.read_legacy()?.is_some() {
            let report = commands::migrate::run(&mut self.store)?;
            self.migration = Some(report);
            self.reload()?;
        }
        Ok(commands::migrate::describe(
            &self.migration.clone().unwrap_or_default(),
        ))
    }

    pub fn doctor(&mut self) -> Result<CmdResult> {
        self.ensure_writable()?;
        let result = commands::doctor::run(&mut self.store)?;
        self.reload()?;
        Ok(result)
    }
}

fn parse_selector(s: &str) -> Result<RecordSelector> {
    s.parse()
}

fn parse_selectors<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<RecordSelector>> {
    if inputs.is_empty() {
        return Err(DiarchError::InvalidSelector("no record selected".to_string()));
    }
    inputs.iter().map(|s| parse_selector(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::upload::UploadForm;
    use crate::quota::{FixedQuota, NoQuota};
    use crate::store::mem_backend::MemBackend;
    use crate::store::{InMemoryStore, RecordStore};
    use crate::test_utils::pdf_bytes;
    use tempfile::TempDir;

    const LEGACY: &str = r#"[{"id": 5, "title": "Old", "category": "Archive", "date": "2019-03-04",
        "fileData": "data:application/pdf;base64,JVBERi0="}]"#;

    fn open_api(backend: MemBackend) -> DiarchApi<InMemoryStore> {
        DiarchApi::open(
            RecordStore::with_backend(backend),
            Box::new(FixedQuota(50 * 1024 * 1024)),
            Layout::Grid,
        )
        .unwrap()
    }

    fn upload(api: &mut DiarchApi<InMemoryStore>, dir: &TempDir, title: &str, category: &str, date: &str) {
        let path = dir.path().join(format!("{}.pdf", title));
        std::fs::write(&path, pdf_bytes(2048)).unwrap();
        api.upload(
            &UploadForm {
                title: title.into(),
                category: category.into(),
                date: date.into(),
                file: Some(path),
            },
            &mut |_| {},
        )
        .unwrap();
    }

    #[test]
    fn test_open_migrates_legacy_once() {
        let mut api = open_api(MemBackend::new().with_legacy(LEGACY));
        assert_eq!(api.state().records.len(), 1);
        assert_eq!(api.store().backend().legacy(), None);
        assert!(!api.take_notices().is_empty());

        let report = api.migrate().unwrap().migration.unwrap();
        assert_eq!(report.migrated, 1);
        assert_eq!(api.state().records.len(), 1);
    }

    #[test]
    fn test_failed_migration_retry_is_an_error() {
        let backend = MemBackend::new().with_legacy(LEGACY);
        let mut api = open_api(backend);
        assert_eq!(api.state().records.len(), 1);

        let again = r#"[{"id": 6, "title": "Older", "category": "Archive", "date": "2018-01-02",
            "fileData": "data:application/pdf;base64,JVBERi0="}]"#;
        api.store().backend().set_legacy(again);
        api.store().backend().set_simulate_write_error(true);

        assert!(matches!(api.migrate(), Err(DiarchError::Store(_))));
        api.store().backend().set_simulate_write_error(false);
        assert_eq!(api.store().backend().legacy().as_deref(), Some(again));

        let report = api.migrate().unwrap().migration.unwrap();
        assert_eq!(report.migrated, 1);
        assert_eq!(api.state().records.len(), 2);
        assert_eq!(api.store().backend().legacy(), None);
    }

    #[test]
    fn test_degraded_mode_reads_legacy_and_refuses_writes() {
        let backend = MemBackend::new().with_legacy(LEGACY);
        backend.set_unavailable(true);
        let mut api = open_api(backend);

        assert!(!api.is_persistent());
        assert_eq!(api.state().records.len(), 1);
        assert_eq!(api.take_notices().len(), 1);
        assert!(matches!(
            api.delete(&["1"], true),
            Err(DiarchError::StorageUnavailable(_))
        ));
        assert!(matches!(
            api.upload(&UploadForm::default(), &mut |_| {}),
            Err(DiarchError::StorageUnavailable(_))
        ));
        // legacy list untouched
        assert!(api.store().backend().legacy().is_some());
    }

    #[test]
    fn test_trip_scenario() {
        let dir = TempDir::new().unwrap();
        let mut api = open_api(MemBackend::new());
        upload(&mut api, &dir, "Trip", "Travel", "2023-05-01");

        let result = api.list(CatalogFilter::default(), None).unwrap();
        assert_eq!(result.listed_records.len(), 1);
        assert_eq!(result.listed_records[0].record.category, "Travel");
        assert_eq!(result.view.unwrap().options.years, vec![2023]);
    }

    #[test]
    fn test_travel_and_work_then_delete() {
        let dir = TempDir::new().unwrap();
        let mut api = open_api(MemBackend::new());
        upload(&mut api, &dir, "Trip", "Travel", "2023-05-01");
        upload(&mut api, &dir, "Standup", "Work", "2022-11-20");

        let stats = api.stats().unwrap().stats.unwrap();
        assert_eq!((stats.total, stats.categories, stats.years), (2, 2, 2));
        assert_eq!(stats.chart(40).len(), 2);

        api.list(
            CatalogFilter {
                category: Some("Travel".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        let travel_id = api
            .state()
            .records
            .iter()
            .find(|r| r.category == "Travel")
            .unwrap()
            .id
            .to_string();
        api.delete(&[travel_id], true).unwrap();

        let result = api.list(CatalogFilter::default(), None).unwrap();
        assert_eq!(result.listed_records.len(), 1);
        assert_eq!(result.listed_records[0].record.category, "Work");
        let options = result.view.unwrap().options;
        assert_eq!(options.categories, vec!["Work"]);
        assert_eq!(options.years, vec![2022]);
        assert_eq!(api.state().filter.category, None);
    }

    #[test]
    fn test_deleting_unknown_id_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut api = open_api(MemBackend::new());
        upload(&mut api, &dir, "Trip", "Travel", "2023-05-01");

        assert!(api.delete(&["nope"], true).is_err());
        assert_eq!(api.store().list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_storage_without_quota() {
        let api = DiarchApi::open(
            RecordStore::with_backend(MemBackend::new()),
            Box::new(NoQuota),
            Layout::List,
        )
        .unwrap();
        let report = api.storage().unwrap().storage.unwrap();
        assert!(report.quota.is_none());
        assert!(report.persistent);
    }

    #[test]
    fn test_empty_selector_list_is_rejected() {
        let mut api = open_api(MemBackend::new());
        let none: [&str; 0] = [];
        assert!(matches!(
            api.delete(&none, true),
            Err(DiarchError::InvalidSelector(_))
        ));
    }
}

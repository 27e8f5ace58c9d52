//! Sessions over a real data directory: upload, browse, delete, reopen.

use diarch::api::DiarchApi;
use diarch::catalog::{CatalogFilter, Layout};
use diarch::commands::upload::UploadForm;
use diarch::error::DiarchError;
use diarch::quota::{FixedQuota, NoQuota, QuotaProbe};
use diarch::store::fs_backend::FsBackend;
use diarch::store::{FileStore, RecordStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LEGACY: &str = r#"[
    {"id": 1682899200123, "title": "Lisbon", "category": "travel", "date": "2021-08-14",
     "fileData": "data:application/pdf;base64,JVBERi0xLjQ=", "fileName": "lisbon.pdf",
     "fileType": "application/pdf", "fileSize": 8, "uploadDate": "2021-08-15T09:30:00Z"}
]"#;

fn open_with(dir: &Path, quota: Box<dyn QuotaProbe>) -> DiarchApi<FileStore> {
    let store = RecordStore::with_backend(FsBackend::new(dir.to_path_buf()));
    DiarchApi::open(store, quota, Layout::Grid).unwrap()
}

fn open(dir: &Path) -> DiarchApi<FileStore> {
    open_with(dir, Box::new(NoQuota))
}

fn pdf(dir: &Path, name: &str, len: usize) -> PathBuf {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(len, b'x');
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn form(title: &str, category: &str, date: &str, file: PathBuf) -> UploadForm {
    UploadForm {
        title: title.to_string(),
        category: category.to_string(),
        date: date.to_string(),
        file: Some(file),
    }
}

#[test]
fn test_upload_list_and_reopen() {
    let data = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();

    let mut api = open(data.path());
    let mut seen: Vec<f64> = Vec::new();
    api.upload(
        &form("Trip", "Travel", "2023-05-01", pdf(files.path(), "trip.pdf", 2048)),
        &mut |p: f64| seen.push(p),
    )
    .unwrap();
    assert_eq!(seen.last().copied(), Some(1.0));

    let listed = api.list(CatalogFilter::default(), None).unwrap();
    assert_eq!(listed.listed_records.len(), 1);
    let trip = &listed.listed_records[0].record;
    assert_eq!(trip.file_name, "trip.pdf");
    assert_eq!(trip.file_size, 2048);
    assert_eq!(listed.view.unwrap().options.years, vec![2023]);
    drop(api);

    let mut reopened = open(data.path());
    let listed = reopened.list(CatalogFilter::default(), None).unwrap();
    assert_eq!(listed.listed_records.len(), 1);
    assert_eq!(listed.listed_records[0].record.title, "Trip");
}

#[test]
fn test_rejected_uploads_leave_the_store_unchanged() {
    let data = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();
    let mut api = open_with(data.path(), Box::new(FixedQuota(3000)));

    let notes = files.path().join("notes.txt");
    fs::write(&notes, "plain text").unwrap();
    assert!(matches!(
        api.upload(&form("Notes", "Work", "2023-01-01", notes), &mut |_| {}),
        Err(DiarchError::UnsupportedType(_))
    ));

    // 2 KB needs 4 KB free against a 3000 byte quota
    let big = pdf(files.path(), "big.pdf", 2048);
    assert!(matches!(
        api.upload(&form("Big", "Work", "2023-01-01", big), &mut |_| {}),
        Err(DiarchError::InsufficientQuota { .. })
    ));

    assert!(api.state().records.is_empty());
    assert!(open(data.path()).state().records.is_empty());
}

#[test]
fn test_stats_then_delete_recomputes_options() {
    let data = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();
    let mut api = open(data.path());

    api.upload(
        &form("Trip", "Travel", "2023-05-01", pdf(files.path(), "trip.pdf", 2048)),
        &mut |_| {},
    )
    .unwrap();
    api.upload(
        &form("Standup", "Work", "2022-11-20", pdf(files.path(), "standup.pdf", 1024)),
        &mut |_| {},
    )
    .unwrap();

    let stats = api.stats().unwrap().stats.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.categories, 2);
    assert_eq!(stats.years, 2);
    assert_eq!(stats.chart(40).len(), 2);

    let filter = CatalogFilter {
        category: Some("Travel".to_string()),
        ..Default::default()
    };
    api.list(filter, Some(Layout::List)).unwrap();

    let travel_index = api
        .list(CatalogFilter::default(), None)
        .unwrap()
        .listed_records
        .iter()
        .find(|dr| dr.record.category == "Travel")
        .map(|dr| dr.index.to_string())
        .unwrap();
    api.delete(&[travel_index], true).unwrap();

    let view = api.list(CatalogFilter::default(), None).unwrap().view.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.records[0].record.category, "Work");
    assert_eq!(view.options.categories, vec!["Work".to_string()]);
    assert_eq!(view.options.years, vec![2022]);

    let reopened = open(data.path());
    assert_eq!(reopened.state().records.len(), 1);
}

#[test]
fn test_download_round_trips_the_file() {
    let data = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut api = open(data.path());

    let source = pdf(files.path(), "trip.pdf", 4096);
    api.upload(&form("Trip", "Travel", "2023-05-01", source.clone()), &mut |_| {})
        .unwrap();

    let result = api.download("1", None, out.path()).unwrap();
    let written = out.path().join("trip.pdf");
    assert_eq!(result.paths, vec![written.clone()]);
    assert_eq!(fs::read(written).unwrap(), fs::read(source).unwrap());

    let viewed = api.view("1", out.path()).unwrap();
    assert!(viewed.paths[0].exists());
}

#[test]
fn test_legacy_file_is_migrated_on_first_open() {
    let data = TempDir::new().unwrap();
    fs::write(data.path().join("diaries.json"), LEGACY).unwrap();

    let mut api = open(data.path());
    assert!(!api.take_notices().is_empty());
    assert_eq!(api.state().records.len(), 1);
    assert_eq!(api.state().records[0].title, "Lisbon");
    assert!(!data.path().join("diaries.json").exists());

    let report = api.migrate().unwrap();
    assert_eq!(report.migration.unwrap().migrated, 1);

    let reopened = open(data.path());
    assert_eq!(reopened.state().records.len(), 1);
}

#[test]
fn test_malformed_legacy_file_is_kept() {
    let data = TempDir::new().unwrap();
    fs::write(data.path().join("diaries.json"), "[{\"title\": 3}]").unwrap();

    let mut api = open(data.path());
    assert!(api.state().records.is_empty());
    assert!(data.path().join("diaries.json").exists());

    let report = api.migrate().unwrap().migration.unwrap();
    assert!(report.abandoned);
    assert!(data.path().join("diaries.json").exists());
}

#[test]
fn test_doctor_and_storage_on_a_real_directory() {
    let data = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();
    let mut api = open_with(data.path(), Box::new(FixedQuota(10 * 1024 * 1024)));
    api.upload(
        &form("Trip", "Travel", "2023-05-01", pdf(files.path(), "trip.pdf", 2048)),
        &mut |_| {},
    )
    .unwrap();

    fs::write(data.path().join("record-7.b64"), "orphan").unwrap();
    let doctor = api.doctor().unwrap().doctor.unwrap();
    assert_eq!(doctor.removed_orphan_payloads, 1);
    assert_eq!(api.state().records.len(), 1);

    let storage = api.storage().unwrap().storage.unwrap();
    assert_eq!(storage.location, data.path().to_path_buf());
    assert!(storage.usage > 2048);
    assert!(storage.persistent);
    assert_eq!(storage.quota.unwrap().quota, 10 * 1024 * 1024);
}

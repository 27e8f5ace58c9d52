//! Upload pipeline: validate, encode with progress, commit.
//!
//! Validation is fail-fast and ordered; the first failing check is the one
//! reported:
//!
//! 1. title, category, date and file are all present
//! 2. the date parses as `YYYY-MM-DD`
//! 3. the file can be inspected
//! 4. the declared media type is PDF
//! 5. the file is at most [`MAX_FILE_SIZE`]
//! 6. the store has room for twice the file size (skipped when the quota is
//!    unknown)

use crate::commands::dispatch;
use crate::commands::{usage_line, CmdMessage, CmdResult};
use crate::encoding::encode_data_url;
use crate::error::{DiarchError, Result};
use crate::model::{parse_date, Record, RecordId, DOCUMENT_MEDIA_TYPE, MAX_FILE_SIZE};
use crate::quota::{QuotaEstimate, QuotaProbe};
use crate::state::{Action, CatalogState};
use crate::store::DataStore;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

const MB: u64 = 1024 * 1024;

/// Raw user input, as typed.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub title: String,
    pub category: String,
    pub date: String,
    pub file: Option<PathBuf>,
}

/// What is known about the chosen file before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub path: PathBuf,
    pub name: String,
    /// Declared media type, guessed from the file name.
    pub media_type: String,
    pub size: u64,
}

impl FileSelection {
    pub fn inspect(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .map_err(|e| DiarchError::ReadError(format!("{}: {}", path.display(), e)))?;
        if !meta.is_file() {
            return Err(DiarchError::ReadError(format!(
                "{} is not a file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            name,
            media_type,
            size: meta.len(),
        })
    }
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUpload {
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub file: FileSelection,
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DiarchError::MissingField(name))
    } else {
        Ok(trimmed)
    }
}

/// Run the four checks in order.
pub fn validate(form: &UploadForm, quota: Option<QuotaEstimate>) -> Result<ValidUpload> {
    let title = required(&form.title, "title")?;
    let category = required(&form.category, "category")?;
    let date = required(&form.date, "date")?;
    let path = form.file.as_ref().ok_or(DiarchError::MissingField("file"))?;
    let date = parse_date(date)?;
    let file = FileSelection::inspect(path)?;

    if file.media_type != DOCUMENT_MEDIA_TYPE {
        return Err(DiarchError::UnsupportedType(file.media_type));
    }

    if file.size > MAX_FILE_SIZE {
        return Err(DiarchError::FileTooLarge {
            size: file.size,
            max_mb: MAX_FILE_SIZE / MB,
        });
    }

    if let Some(estimate) = quota {
        let needed = file.size.saturating_mul(2);
        if estimate.available() < needed {
            return Err(DiarchError::InsufficientQuota {
                available_mb: estimate.available() / MB,
                needed_mb: (needed + MB / 2) / MB,
            });
        }
    }

    Ok(ValidUpload {
        title: title.to_string(),
        category: category.to_string(),
        date,
        file,
    })
}

/// Read and encode the file, then build the record.
pub fn encode(upload: ValidUpload, on_progress: &mut dyn FnMut(f64)) -> Result<Record> {
    let reader = File::open(&upload.file.path)
        .map_err(|e| DiarchError::ReadError(format!("{}: {}", upload.file.path.display(), e)))?;
    let encoded_file = encode_data_url(
        reader,
        &upload.file.media_type,
        upload.file.size,
        on_progress,
    )?;

    let now = Utc::now();
    Ok(Record {
        id: RecordId::from_timestamp(now),
        title: upload.title,
        category: upload.category,
        date: upload.date,
        encoded_file,
        file_name: upload.file.name,
        file_type: upload.file.media_type,
        file_size: upload.file.size,
        upload_timestamp: now,
    })
}

/// Millisecond id for `at`, moved forward past ids already in the catalog.
/// Another process can still take the same id first; `add` catches that.
fn fresh_id(at: DateTime<Utc>, existing: &[Record]) -> RecordId {
    let mut at = at;
    loop {
        let id = RecordId::from_timestamp(at);
        if !existing.iter().any(|r| r.id == id) {
            return id;
        }
        at += Duration::milliseconds(1);
    }
}

pub fn run<S: DataStore>(
    store: &mut S,
    state: &mut CatalogState,
    form: &UploadForm,
    quota: &dyn QuotaProbe,
    on_progress: &mut dyn FnMut(f64),
) -> Result<CmdResult> {
    let usage = store.usage_bytes()?;
    let valid = validate(form, quota.estimate(usage))?;
    debug!(file = %valid.file.path.display(), size = valid.file.size, "upload validated");

    let mut record = encode(valid, on_progress)?;
    record.id = fresh_id(record.upload_timestamp, &state.records);
    let mut result = dispatch::run(store, state, Action::Commit(record))?;

    if let Some(estimate) = quota.estimate(store.usage_bytes()?) {
        result.add_message(CmdMessage::info(usage_line(&estimate)));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::{FixedQuota, NoQuota};
    use crate::test_utils::{open_store, pdf_bytes};
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn form(file: Option<PathBuf>) -> UploadForm {
        UploadForm {
            title: "Trip".into(),
            category: "Travel".into(),
            date: "2023-05-01".into(),
            file,
        }
    }

    #[test]
    fn test_valid_upload_adds_one_record() {
        let dir = TempDir::new().unwrap();
        let bytes = pdf_bytes(2048);
        let path = write_file(&dir, "trip.pdf", &bytes);
        let mut store = open_store();
        let mut state = CatalogState::default();
        let mut progress = Vec::new();

        let result = run(
            &mut store,
            &mut state,
            &form(Some(path)),
            &FixedQuota(10 * MB),
            &mut |p| progress.push(p),
        )
        .unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "Trip");
        assert_eq!(r.category, "Travel");
        assert_eq!(r.date, parse_date("2023-05-01").unwrap());
        assert_eq!(r.file_name, "trip.pdf");
        assert_eq!(r.file_size, 2048);
        assert_eq!(r.file_type, DOCUMENT_MEDIA_TYPE);
        assert_eq!(state.options().years, vec![2023]);
        assert_eq!(progress.last(), Some(&1.0));
        assert!(result
            .messages
            .iter()
            .any(|m| m.content.starts_with("Storage used:")));
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let mut f = form(None);
        f.title = "  ".into();
        f.category.clear();
        assert!(matches!(
            validate(&f, None),
            Err(DiarchError::MissingField("title"))
        ));

        f.title = "Trip".into();
        assert!(matches!(
            validate(&f, None),
            Err(DiarchError::MissingField("category"))
        ));

        let f = form(None);
        assert!(matches!(
            validate(&f, None),
            Err(DiarchError::MissingField("file"))
        ));
    }

    #[test]
    fn test_malformed_date_is_invalid() {
        let dir = TempDir::new().unwrap();
        let mut f = form(Some(write_file(&dir, "a.pdf", b"%PDF")));
        f.date = "May 1st".into();
        assert!(matches!(validate(&f, None), Err(DiarchError::InvalidDate(_))));
    }

    #[test]
    fn test_non_pdf_is_rejected_without_adding() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "notes.txt", b"hello");
        let mut store = open_store();
        let mut state = CatalogState::default();

        let err = run(&mut store, &mut state, &form(Some(path)), &NoQuota, &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, DiarchError::UnsupportedType(t) if t == "text/plain"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_type_is_checked_before_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let file = File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();
        assert!(matches!(
            validate(&form(Some(path)), None),
            Err(DiarchError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_oversized_pdf_is_too_large() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.pdf");
        let file = File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();
        let err = validate(&form(Some(path)), None).unwrap_err();
        assert!(matches!(err, DiarchError::FileTooLarge { max_mb: 100, .. }));
    }

    #[test]
    fn test_exactly_max_size_is_allowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edge.pdf");
        let file = File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE).unwrap();
        assert!(validate(&form(Some(path)), None).is_ok());
    }

    #[test]
    fn test_quota_needs_twice_the_size() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.pdf", &pdf_bytes(1000));

        let tight = QuotaEstimate {
            usage: 0,
            quota: 1999,
        };
        assert!(matches!(
            validate(&form(Some(path.clone())), Some(tight)),
            Err(DiarchError::InsufficientQuota { .. })
        ));

        let enough = QuotaEstimate {
            usage: 0,
            quota: 2000,
        };
        assert!(validate(&form(Some(path)), Some(enough)).is_ok());
    }

    #[test]
    fn test_unreadable_file_is_read_error() {
        let f = form(Some(PathBuf::from("/definitely/not/here.pdf")));
        assert!(matches!(validate(&f, None), Err(DiarchError::ReadError(_))));
    }

    #[test]
    fn test_fields_are_trimmed() {
        let dir = TempDir::new().unwrap();
        let mut f = form(Some(write_file(&dir, "a.pdf", b"%PDF")));
        f.title = "  Trip  ".into();
        let valid = validate(&f, None).unwrap();
        assert_eq!(valid.title, "Trip");
    }

    #[test]
    fn test_fresh_id_skips_ids_in_the_catalog() {
        use chrono::TimeZone;
        use crate::test_utils::make_record;

        let at = Utc.timestamp_millis_opt(1_682_899_200_000).unwrap();
        assert_eq!(fresh_id(at, &[]).as_str(), "1682899200000");

        let taken = vec![
            make_record("1682899200000", "A", "x", "2023-05-01"),
            make_record("1682899200001", "B", "x", "2023-05-01"),
        ];
        assert_eq!(fresh_id(at, &taken).as_str(), "1682899200002");
    }
}

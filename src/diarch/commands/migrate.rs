//! # Legacy Migration
//!
//! Older versions kept every diary in one JSON list (`diaries.json`). On the
//! first open of a session the list is copied into the record store and then
//! removed.
//!
//! The old format is read leniently: the payload may be named `fileData` or
//! `fileURL`, the creation time `uploadDate`, ids may be numbers, and
//! `fileType`, `fileSize` and `uploadDate` may be missing entirely.
//!
//! Failure handling:
//! - unparseable list: logged and abandoned, the list stays where it is
//! - duplicate ids: skipped and counted, the list is still cleared
//! - any other storage error: the run stops and the list stays

use crate::commands::{CmdMessage, CmdResult};
use crate::encoding::DataUrl;
use crate::error::{DiarchError, Result};
use crate::model::{parse_date, Record, RecordId, DOCUMENT_MEDIA_TYPE};
use crate::store::DataStore;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Entries in the legacy list.
    pub found: usize,
    pub migrated: usize,
    /// Entries skipped because the id already existed.
    pub duplicates: usize,
    /// The legacy list could not be parsed and was left in place.
    pub abandoned: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    id: LegacyId,
    title: String,
    category: String,
    date: String,
    #[serde(alias = "fileData", alias = "fileURL")]
    encoded_file: String,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default, alias = "uploadDate")]
    upload_timestamp: Option<DateTime<Utc>>,
}

impl LegacyRecord {
    fn into_record(self) -> Result<Record> {
        let id = match self.id {
            LegacyId::Number(n) => RecordId::parse(&n.to_string())?,
            LegacyId::Text(s) => RecordId::parse(s.trim())?,
        };
        let url = DataUrl::parse(&self.encoded_file).ok();
        let file_type = self
            .file_type
            .or_else(|| url.map(|u| u.media_type().to_string()))
            .unwrap_or_else(|| DOCUMENT_MEDIA_TYPE.to_string());
        let file_size = self
            .file_size
            .or_else(|| url.and_then(|u| u.decoded_len()))
            .unwrap_or(0);
        let file_name = self
            .file_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("diary-{}.pdf", id));

        Ok(Record {
            title: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            date: parse_date(&self.date)?,
            encoded_file: self.encoded_file,
            file_name,
            file_type,
            file_size,
            upload_timestamp: self.upload_timestamp.unwrap_or_else(Utc::now),
            id,
        })
    }
}

/// Parse the legacy list into records. Any malformed entry fails the whole list.
pub fn parse_legacy(raw: &str) -> Result<Vec<Record>> {
    let entries: Vec<LegacyRecord> = serde_json::from_str(raw)?;
    entries.into_iter().map(LegacyRecord::into_record).collect()
}

/// Move the legacy list into `store`. The store must already be open.
pub fn run<S: DataStore>(store: &mut S) -> Result<MigrationReport> {
    let Some(raw) = store.read_legacy()? else {
        return Ok(MigrationReport::default());
    };

    let records = match parse_legacy(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "legacy list could not be parsed, migration abandoned");
            return Ok(MigrationReport {
                abandoned: true,
                ..Default::default()
            });
        }
    };

    let mut report = MigrationReport {
        found: records.len(),
        ..Default::default()
    };
    for record in &records {
        match store.add(record) {
            Ok(()) => report.migrated += 1,
            Err(DiarchError::DuplicateKey(id)) => {
                warn!(id = %id, "legacy record already in store, skipped");
                report.duplicates += 1;
            }
            Err(e) => return Err(e),
        }
    }

    store.clear_legacy()?;
    info!(
        migrated = report.migrated,
        duplicates = report.duplicates,
        "migrated legacy diaries"
    );
    Ok(report)
}

/// Messages describing a migration report.
pub fn describe(report: &MigrationReport) -> CmdResult {
    let mut result = CmdResult::default();
    if report.abandoned {
        result.add_message(CmdMessage::warning(
            "The legacy diary list could not be read; it was left untouched.",
        ));
    } else if report.found == 0 {
        result.add_message(CmdMessage::info("Nothing to migrate."));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Migrated {} of {} legacy diaries.",
            report.migrated, report.found
        )));
        if report.duplicates > 0 {
            result.add_message(CmdMessage::warning(format!(
                "Skipped {} already present.",
                report.duplicates
            )));
        }
    }
    result.migration = Some(report.clone());
    result
}

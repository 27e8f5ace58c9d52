use crate::error::{DiarchError, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The single document type the archive accepts.
pub const DOCUMENT_MEDIA_TYPE: &str = "application/pdf";

/// Upload ceiling: 100 MiB.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

const MAX_ID_LEN: usize = 64;

/// Primary key of a [`Record`].
///
/// New ids are the upload timestamp in milliseconds. Ids also name payload
/// files on disk, so only `[A-Za-z0-9_-]` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis().to_string())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(DiarchError::InvalidSelector(format!(
                "'{}' is not a valid record id",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = DiarchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).map_err(|e| e.to_string())
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// One archived document: metadata plus the embedded, encoded file.
///
/// Records are never updated in place; they are created by an upload (or a
/// legacy import) and destroyed by a confirmed delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    /// `data:` URL holding the whole file.
    pub encoded_file: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub upload_timestamp: DateTime<Utc>,
}

impl Record {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn metadata(&self) -> RecordMeta {
        RecordMeta {
            id: self.id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            date: self.date,
            file_name: self.file_name.clone(),
            file_type: self.file_type.clone(),
            file_size: self.file_size,
            upload_timestamp: self.upload_timestamp,
        }
    }

    pub fn from_parts(meta: RecordMeta, encoded_file: String) -> Self {
        Self {
            id: meta.id,
            title: meta.title,
            category: meta.category,
            date: meta.date,
            encoded_file,
            file_name: meta.file_name,
            file_type: meta.file_type,
            file_size: meta.file_size,
            upload_timestamp: meta.upload_timestamp,
        }
    }
}

/// Everything in a [`Record`] except the payload.
///
/// This is what the store keeps in its index so lookups never touch payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub id: RecordId,
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub upload_timestamp: DateTime<Utc>,
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DiarchError::InvalidDate(raw.trim().to_string()))
}

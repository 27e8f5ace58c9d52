use crate::model::RecordId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiarchError {
    #[error("Persistent storage is unavailable: {0}")]
    StorageUnavailable(String),

    #[error("A record with id {0} already exists")]
    DuplicateKey(RecordId),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Please fill in all fields (missing: {0})")]
    MissingField(&'static str),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Only PDF files are allowed (got {0})")]
    UnsupportedType(String),

    #[error("The file is too large ({size} bytes). Maximum size: {max_mb}MB")]
    FileTooLarge { size: u64, max_mb: u64 },

    #[error("Not enough storage space. Available: {available_mb}MB, needed: {needed_mb}MB")]
    InsufficientQuota { available_mb: u64, needed_mb: u64 },

    #[error("Error reading the file: {0}")]
    ReadError(String),

    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, DiarchError>;

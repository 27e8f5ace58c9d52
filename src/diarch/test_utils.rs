use crate::model::{parse_date, Record, RecordId, DOCUMENT_MEDIA_TYPE};
use crate::store::mem_backend::MemBackend;
use crate::store::{DataStore, InMemoryStore, RecordStore};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;

/// Minimal bytes that look like a PDF to anything that sniffs the header.
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(len.max(bytes.len()), b'x');
    bytes
}

/// A well-formed record whose payload matches its metadata.
pub fn make_record(id: &str, title: &str, category: &str, date: &str) -> Record {
    let bytes = pdf_bytes(64);
    Record {
        id: RecordId::parse(id).expect("test id"),
        title: title.to_string(),
        category: category.to_string(),
        date: parse_date(date).expect("test date"),
        encoded_file: format!("data:{};base64,{}", DOCUMENT_MEDIA_TYPE, STANDARD.encode(&bytes)),
        file_name: format!("{}.pdf", title.to_lowercase()),
        file_type: DOCUMENT_MEDIA_TYPE.to_string(),
        file_size: bytes.len() as u64,
        upload_timestamp: Utc::now(),
    }
}

/// An opened in-memory store.
pub fn open_store() -> InMemoryStore {
    let mut store = RecordStore::with_backend(MemBackend::new());
    store.initialize().expect("memory store opens");
    store
}

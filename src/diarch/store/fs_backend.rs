use super::backend::{RecordIndex, StorageBackend};
use super::SchemaInfo;
use crate::error::{DiarchError, Result};
use crate::model::RecordId;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SCHEMA_FILE: &str = "schema.json";
const INDEX_FILE: &str = "index.json";
const LEGACY_FILE: &str = "diaries.json";
const PAYLOAD_PREFIX: &str = "record-";
const PAYLOAD_EXT: &str = ".b64";

pub struct FsBackend {
    root: PathBuf,
    legacy_file: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        let legacy_file = root.join(LEGACY_FILE);
        Self { root, legacy_file }
    }

    pub fn with_legacy_file(mut self, path: PathBuf) -> Self {
        self.legacy_file = path;
        self
    }

    pub fn legacy_file(&self) -> &Path {
        &self.legacy_file
    }

    fn payload_filename(id: &RecordId) -> String {
        format!("{}{}{}", PAYLOAD_PREFIX, id, PAYLOAD_EXT)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(DiarchError::Io)?;
        }
        Ok(())
    }

    /// Write to a temp file in the same directory, then rename over the target.
    fn write_atomic(&self, target: &Path, content: &str) -> Result<()> {
        self.ensure_dir()?;
        let tmp = self.root.join(format!(".write-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).map_err(DiarchError::Io)?;
        if let Err(e) = fs::rename(&tmp, target) {
            let _ = fs::remove_file(&tmp);
            return Err(DiarchError::Io(e));
        }
        Ok(())
    }

    fn read_optional(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path).map(Some).map_err(DiarchError::Io)
    }
}

impl StorageBackend for FsBackend {
    fn probe(&self) -> Result<()> {
        let unavailable =
            |e: std::io::Error| DiarchError::StorageUnavailable(format!("{}: {}", self.root.display(), e));

        fs::create_dir_all(&self.root).map_err(unavailable)?;
        let probe = self.root.join(format!(".probe-{}.tmp", Uuid::new_v4()));
        fs::write(&probe, b"ok").map_err(unavailable)?;
        fs::remove_file(&probe).map_err(unavailable)?;
        Ok(())
    }

    fn load_schema(&self) -> Result<Option<SchemaInfo>> {
        match Self::read_optional(&self.root.join(SCHEMA_FILE))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_schema(&self, schema: &SchemaInfo) -> Result<()> {
        let content = serde_json::to_string_pretty(schema)?;
        self.write_atomic(&self.root.join(SCHEMA_FILE), &content)
    }

    fn load_index(&self) -> Result<RecordIndex> {
        match Self::read_optional(&self.root.join(INDEX_FILE))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(RecordIndex::new()),
        }
    }

    fn save_index(&self, index: &RecordIndex) -> Result<()> {
        let content = serde_json::to_string_pretty(index)?;
        self.write_atomic(&self.root.join(INDEX_FILE), &content)
    }

    fn read_payload(&self, id: &RecordId) -> Result<Option<String>> {
        Self::read_optional(&self.root.join(Self::payload_filename(id)))
    }

    fn write_payload(&self, id: &RecordId, payload: &str) -> Result<()> {
        self.write_atomic(&self.root.join(Self::payload_filename(id)), payload)
    }

    fn delete_payload(&self, id: &RecordId) -> Result<()> {
        let path = self.root.join(Self::payload_filename(id));
        if path.exists() {
            fs::remove_file(path).map_err(DiarchError::Io)?;
        }
        Ok(())
    }

    fn list_payload_ids(&self) -> Result<Vec<RecordId>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(DiarchError::Io)? {
            let path = entry.map_err(DiarchError::Io)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let id_part = name
                .strip_prefix(PAYLOAD_PREFIX)
                .and_then(|rest| rest.strip_suffix(PAYLOAD_EXT));
            if let Some(id) = id_part.and_then(|raw| RecordId::parse(raw).ok()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn read_legacy(&self) -> Result<Option<String>> {
        Self::read_optional(&self.legacy_file)
    }

    fn clear_legacy(&self) -> Result<()> {
        if self.legacy_file.exists() {
            fs::remove_file(&self.legacy_file).map_err(DiarchError::Io)?;
        }
        Ok(())
    }

    fn usage_bytes(&self) -> Result<u64> {
        if !self.root.exists() {
            return Ok(0);
        }
        let mut total = 0;
        for entry in fs::read_dir(&self.root).map_err(DiarchError::Io)? {
            let meta = entry.map_err(DiarchError::Io)?.metadata().map_err(DiarchError::Io)?;
            if meta.is_file() {
                total += meta.len();
            }
        }
        Ok(total)
    }

    fn location(&self) -> PathBuf {
        self.root.clone()
    }
}

use crate::api::DiarchApi;
use crate::config::{DiarchConfig, CONFIG_FILE_NAME};
use crate::error::{DiarchError, Result};
use crate::quota::probe_for;
use crate::store::fs_backend::FsBackend;
use crate::store::{FileStore, RecordStore};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Points at an alternative config file.
pub const CONFIG_ENV: &str = "DIARCH_CONFIG";

pub struct DiarchContext {
    pub api: DiarchApi<FileStore>,
    pub config: DiarchConfig,
    pub data_dir: PathBuf,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "diarch", "diarch")
        .ok_or_else(|| DiarchError::Config("could not determine home directory".to_string()))
}

/// Config file to read: `$DIARCH_CONFIG`, else `diarch.toml` in the OS config dir.
pub fn config_file() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("com", "diarch", "diarch").map(|d| d.config_dir().join(CONFIG_FILE_NAME))
}

/// Resolve the data directory: explicit override, then config, then the OS default.
pub fn resolve_data_dir(data_override: Option<&Path>, config: &DiarchConfig) -> Result<PathBuf> {
    if let Some(dir) = data_override {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = &config.data_dir {
        return Ok(dir.clone());
    }
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Build a file-backed session from a loaded config.
pub fn open(config: DiarchConfig, data_override: Option<&Path>) -> Result<DiarchContext> {
    let data_dir = resolve_data_dir(data_override, &config)?;
    let mut backend = FsBackend::new(data_dir.clone());
    if let Some(legacy) = &config.legacy_file {
        backend = backend.with_legacy_file(legacy.clone());
    }
    debug!(data_dir = %data_dir.display(), legacy = %backend.legacy_file().display(), "opening store");

    let quota = probe_for(&data_dir, config.quota_check, config.quota_mb);
    let api = DiarchApi::open(RecordStore::with_backend(backend), quota, config.layout()?)?;

    Ok(DiarchContext {
        api,
        config,
        data_dir,
    })
}

/// Load configuration from the usual places and open a session.
pub fn initialize(data_override: Option<&Path>) -> Result<DiarchContext> {
    let config = DiarchConfig::load(config_file().as_deref())?;
    open(config, data_override)
}

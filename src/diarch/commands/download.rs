//! Decode a record's embedded file back to disk.
//!
//! `download` writes it where the user asks (default: the original file name
//! in the current directory). `view` writes it to the temp directory so the
//! CLI can hand the path to the system viewer.

use crate::commands::{CmdMessage, CmdResult};
use crate::encoding::DataUrl;
use crate::error::{DiarchError, Result};
use crate::index::RecordSelector;
use crate::model::Record;
use crate::state::CatalogState;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::helpers::{safe_file_name, select};

fn decode(record: &Record) -> Result<Vec<u8>> {
    let url = DataUrl::parse(&record.encoded_file)?;
    let bytes = url.decode()?;
    if bytes.len() as u64 != record.file_size {
        debug!(
            id = %record.id,
            expected = record.file_size,
            actual = bytes.len(),
            "decoded size differs from recorded size"
        );
    }
    Ok(bytes)
}

fn default_name(record: &Record) -> String {
    safe_file_name(&record.file_name, &format!("diary-{}.pdf", record.id))
}

fn write_record(record: &Record, target: &Path) -> Result<()> {
    let bytes = decode(record)?;
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes)?;
    Ok(())
}

/// Write the selected record to `output`, or to `dir/<file name>` when
/// `output` is a directory or absent.
pub fn run(
    state: &CatalogState,
    selector: &RecordSelector,
    output: Option<&Path>,
    cwd: &Path,
) -> Result<CmdResult> {
    let targets = select(state, std::slice::from_ref(selector))?;
    let Some(target) = targets.into_iter().next() else {
        return Err(DiarchError::InvalidSelector(selector.to_string()));
    };

    let path = match output {
        Some(p) if p.is_dir() => p.join(default_name(&target.record)),
        Some(p) => p.to_path_buf(),
        None => cwd.join(default_name(&target.record)),
    };
    write_record(&target.record, &path)?;

    let mut result = CmdResult::default().with_paths(vec![path.clone()]);
    result.add_message(CmdMessage::success(format!(
        "Downloaded ({}) {} to {}",
        target.index,
        target.record.title,
        path.display()
    )));
    result.affected_records.push(target.record);
    Ok(result)
}

/// Decode the selected record into `temp_dir` for viewing.
pub fn view(state: &CatalogState, selector: &RecordSelector, temp_dir: &Path) -> Result<CmdResult> {
    let targets = select(state, std::slice::from_ref(selector))?;
    let Some(target) = targets.into_iter().next() else {
        return Err(DiarchError::InvalidSelector(selector.to_string()));
    };

    let path: PathBuf = temp_dir.join(format!(
        "diarch-{}-{}",
        target.record.id,
        default_name(&target.record)
    ));
    write_record(&target.record, &path)?;

    let mut result = CmdResult::default().with_paths(vec![path]);
    result.affected_records.push(target.record);
    Ok(result)
}

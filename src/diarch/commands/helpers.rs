use crate::error::Result;
use crate::index::{index_records, resolve, DisplayRecord, RecordSelector};
use crate::state::CatalogState;
use std::path::Path;

pub fn indexed_records(state: &CatalogState) -> Vec<DisplayRecord> {
    index_records(state.records.clone())
}

/// Records picked by `selectors`, in selector order.
pub fn select(state: &CatalogState, selectors: &[RecordSelector]) -> Result<Vec<DisplayRecord>> {
    let indexed = indexed_records(state);
    Ok(resolve(&indexed, selectors)?.into_iter().cloned().collect())
}

/// Last path component of a stored file name, never empty.
///
/// Legacy records may carry names with directory parts; those are dropped so
/// a download cannot write outside the chosen directory.
pub fn safe_file_name(name: &str, fallback: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let base = Path::new(base)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if base.is_empty() || base == ".." {
        fallback.to_string()
    } else {
        base.to_string()
    }
}

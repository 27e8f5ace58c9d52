use crate::commands::{usage_line, CmdMessage, CmdResult};
use crate::error::Result;
use crate::quota::{QuotaEstimate, QuotaProbe};
use crate::store::DataStore;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageReport {
    pub location: PathBuf,
    pub usage: u64,
    /// `None` when the platform cannot report a quota.
    pub quota: Option<QuotaEstimate>,
    /// False when running on the read-only legacy fallback.
    pub persistent: bool,
}

pub fn run<S: DataStore>(store: &S, quota: &dyn QuotaProbe, persistent: bool) -> Result<CmdResult> {
    let usage = store.usage_bytes()?;
    let estimate = quota.estimate(usage);
    let mut result = CmdResult::default();

    match &estimate {
        Some(e) => result.add_message(CmdMessage::info(usage_line(e))),
        None => result.add_message(CmdMessage::info(format!(
            "Storage used: {:.2} MB (quota unknown)",
            usage as f64 / (1024.0 * 1024.0)
        ))),
    }
    if !persistent {
        result.add_message(CmdMessage::warning(
            "Persistent storage is unavailable; changes cannot be saved",
        ));
    }

    result.storage = Some(StorageReport {
        location: store.location(),
        usage,
        quota: estimate,
        persistent,
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::dispatch;
    use crate::quota::{FixedQuota, NoQuota};
    use crate::state::{Action, CatalogState};
    use crate::test_utils::{make_record, open_store};

    #[test]
    fn test_reports_usage_against_quota() {
        let mut store = open_store();
        let mut state = CatalogState::default();
        dispatch::run(
            &mut store,
            &mut state,
            Action::Commit(make_record("1", "Trip", "Travel", "2023-05-01")),
        )
        .unwrap();

        let result = run(&store, &FixedQuota(1024 * 1024), true).unwrap();
        let report = result.storage.unwrap();
        assert!(report.usage > 0);
        assert_eq!(report.quota.unwrap().quota, 1024 * 1024);
        assert!(result.messages[0].content.starts_with("Storage used:"));
    }

    #[test]
    fn test_unknown_quota() {
        let store = open_store();
        let result = run(&store, &NoQuota, false).unwrap();
        assert!(result.storage.unwrap().quota.is_none());
        assert_eq!(result.messages.len(), 2);
    }
}

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::DataStore;

pub fn run<S: DataStore>(store: &mut S) -> Result<CmdResult> {
    let report = store.doctor()?;
    let mut result = CmdResult::default();

    if report.is_clean() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
    } else {
        result.add_message(CmdMessage::warning("Inconsistencies found:"));
        if report.removed_missing_payloads > 0 {
            result.add_message(CmdMessage::info(format!(
                "  - Removed {} record(s) whose file was missing.",
                report.removed_missing_payloads
            )));
        }
        if report.removed_orphan_payloads > 0 {
            result.add_message(CmdMessage::info(format!(
                "  - Deleted {} stored file(s) not belonging to any record.",
                report.removed_orphan_payloads
            )));
        }
        for id in &report.invalid_payloads {
            result.add_message(CmdMessage::warning(format!(
                "  - Record {} does not match its recorded size or type.",
                id
            )));
        }
    }

    result.doctor = Some(report);
    Ok(result)
}

use crate::commands::dispatch;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::RecordSelector;
use crate::state::{Action, CatalogState};
use crate::store::DataStore;

use super::helpers::select;

/// Delete the selected records. Without confirmation nothing is removed.
pub fn run<S: DataStore>(
    store: &mut S,
    state: &mut CatalogState,
    selectors: &[RecordSelector],
    confirmed: bool,
) -> Result<CmdResult> {
    let targets = select(state, selectors)?;
    let mut result = CmdResult::default();

    if !confirmed {
        result.add_message(CmdMessage::warning("Deletion cancelled"));
        return Ok(result);
    }

    for target in targets {
        dispatch::run(
            store,
            state,
            Action::Delete {
                id: target.record.id.clone(),
                confirmed,
            },
        )?;
        result.add_message(CmdMessage::success(format!(
            "Diary deleted ({}): {}",
            target.index, target.record.title
        )));
        result.affected_records.push(target.record);
    }

    Ok(result)
}

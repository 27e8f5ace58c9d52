use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DiarchError, Result};
use crate::state::{reduce, Action, CatalogState, Effect};
use crate::store::DataStore;
use tracing::{debug, info};

/// Reduce `action` into `state`, then run the resulting effects against `store`.
///
/// The state is updated before any effect runs; an effect that fails stops
/// the remaining ones and leaves the state as the reducer left it.
pub fn run<S: DataStore>(
    store: &mut S,
    state: &mut CatalogState,
    action: Action,
) -> Result<CmdResult> {
    let transition = reduce(std::mem::take(state), action);
    *state = transition.state;

    let mut result = CmdResult::default();
    for effect in transition.effects {
        match effect {
            Effect::Insert(record) => {
                store.add(&record).map_err(|e| match e {
                    DiarchError::DuplicateKey(id) => DiarchError::UploadFailed(format!(
                        "a record with id {} already exists",
                        id
                    )),
                    other => other,
                })?;
                info!(id = %record.id, title = %record.title, "record committed");
                result.affected_records.push(record);
            }
            Effect::Remove(id) => {
                store.remove(&id)?;
                info!(id = %id, "record deleted");
            }
            Effect::Refresh => {
                let records = store.list_all()?;
                debug!(count = records.len(), "catalog refreshed");
                *state = reduce(std::mem::take(state), Action::Loaded(records)).state;
            }
            Effect::Notify(message) => result.add_message(CmdMessage::info(message)),
        }
    }

    Ok(result)
}

use crate::catalog::CatalogStats;
use crate::commands::CmdResult;
use crate::error::Result;
use crate::state::CatalogState;

pub fn run(state: &CatalogState) -> Result<CmdResult> {
    Ok(CmdResult::default().with_stats(CatalogStats::from_records(&state.records)))
}

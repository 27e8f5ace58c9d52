use crate::catalog::{CatalogFilter, Layout};
use crate::commands::CmdResult;
use crate::error::Result;
use crate::state::{reduce, Action, CatalogState};

/// Apply a filter selection (and layout, if given) and project the catalog.
pub fn run(
    state: &mut CatalogState,
    filter: CatalogFilter,
    layout: Option<Layout>,
) -> Result<CmdResult> {
    let actions = [
        Action::Search(filter.search),
        Action::FilterYear(filter.year),
        Action::FilterCategory(filter.category),
        Action::FilterDate(filter.date),
    ];
    for action in actions.into_iter().chain(layout.map(Action::SetLayout)) {
        *state = reduce(std::mem::take(state), action).state;
    }
    Ok(CmdResult::default().with_view(state.view()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EmptyState;
    use crate::test_utils::make_record;

    fn state() -> CatalogState {
        reduce(
            CatalogState::default(),
            Action::Loaded(vec![
                make_record("1", "Trip", "Travel", "2023-05-01"),
                make_record("2", "Standup", "Work", "2022-01-03"),
            ]),
        )
        .state
    }

    #[test]
    fn test_lists_everything_by_default() {
        let mut state = state();
        let result = run(&mut state, CatalogFilter::default(), None).unwrap();
        assert_eq!(result.listed_records.len(), 2);
        assert_eq!(result.view.unwrap().layout, Layout::Grid);
    }

    #[test]
    fn test_filters_by_year() {
        let mut state = state();
        let result = run(
            &mut state,
            CatalogFilter {
                year: Some(2022),
                ..Default::default()
            },
            Some(Layout::List),
        )
        .unwrap();
        assert_eq!(result.listed_records.len(), 1);
        assert_eq!(result.listed_records[0].record.title, "Standup");
        assert_eq!(state.layout, Layout::List);
    }

    #[test]
    fn test_reports_no_matches() {
        let mut state = state();
        let result = run(
            &mut state,
            CatalogFilter {
                search: Some("nothing".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(result.view.unwrap().empty, Some(EmptyState::NoMatches));
    }
}

//! # Catalog State
//!
//! Everything the catalog shows lives in one [`CatalogState`], owned by the
//! API controller. It changes only through [`reduce`], which takes an
//! [`Action`] and returns the next state plus the [`Effect`]s the controller
//! must carry out against the store. The reducer itself never does I/O.
//!
//! ```text
//! Action ──► reduce(state) ──► (state', [Effect]) ──► controller runs effects
//!                                                        │
//!                           Action::Loaded(records) ◄────┘ (after Refresh)
//! ```

use crate::catalog::{project, CatalogFilter, CatalogView, FilterOptions, Layout};
use crate::model::{Record, RecordId};
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    pub records: Vec<Record>,
    pub filter: CatalogFilter,
    pub layout: Layout,
}

impl CatalogState {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_records(&self.records)
    }

    pub fn view(&self) -> CatalogView {
        project(self.records.clone(), &self.filter, self.layout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fresh record list from the store.
    Loaded(Vec<Record>),
    Search(Option<String>),
    FilterYear(Option<i32>),
    FilterCategory(Option<String>),
    FilterDate(Option<NaiveDate>),
    SetLayout(Layout),
    /// A validated, encoded record ready to be stored.
    Commit(Record),
    Delete { id: RecordId, confirmed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Insert(Record),
    Remove(RecordId),
    /// Reload every record and feed them back as `Action::Loaded`.
    Refresh,
    Notify(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: CatalogState,
    pub effects: Vec<Effect>,
}

pub fn reduce(mut state: CatalogState, action: Action) -> Transition {
    let mut effects = Vec::new();

    match action {
        Action::Loaded(records) => {
            state.records = records;
            let options = state.options();
            if state.filter.year.is_some_and(|y| !options.years.contains(&y)) {
                state.filter.year = None;
            }
            if state
                .filter
                .category
                .as_ref()
                .is_some_and(|c| !options.categories.contains(c))
            {
                state.filter.category = None;
            }
        }
        Action::Search(term) => {
            state.filter.search = term
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
        }
        Action::FilterYear(year) => state.filter.year = year,
        Action::FilterCategory(category) => {
            state.filter.category = category.filter(|c| !c.trim().is_empty());
        }
        Action::FilterDate(date) => state.filter.date = date,
        Action::SetLayout(layout) => state.layout = layout,
        Action::Commit(record) => {
            let title = record.title.clone();
            effects.push(Effect::Insert(record));
            effects.push(Effect::Refresh);
            effects.push(Effect::Notify(format!("Diary '{}' uploaded", title)));
        }
        Action::Delete { id, confirmed } => {
            if confirmed {
                effects.push(Effect::Remove(id));
                effects.push(Effect::Refresh);
            } else {
                effects.push(Effect::Notify("Deletion cancelled".to_string()));
            }
        }
    }

    Transition { state, effects }
}

//! # Catalog View
//!
//! The catalog is an in-memory projection over every record: filters, the
//! option lists the filters offer, layout, empty states and statistics. None
//! of it touches storage; it works on whatever `list_all` returned.
//!
//! Filter options are always computed from the full record list, not from
//! the filtered one, so narrowing by category never hides other years.

use crate::error::{DiarchError, Result};
use crate::index::{index_records, DisplayRecord};
use crate::model::Record;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Grid,
    List,
}

impl FromStr for Layout {
    type Err = DiarchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Layout::Grid),
            "list" => Ok(Layout::List),
            other => Err(DiarchError::Config(format!(
                "unknown layout '{}', expected grid or list",
                other
            ))),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Grid => f.write_str("grid"),
            Layout::List => f.write_str("list"),
        }
    }
}

/// Active filter selection. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
}

impl CatalogFilter {
    pub fn is_active(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.year.is_some()
            || self.category.is_some()
            || self.date.is_some()
    }

    pub fn matches(&self, record: &Record) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                record.title.to_lowercase().contains(&term)
                    || record.category.to_lowercase().contains(&term)
            }
        };
        let matches_year = self.year.is_none_or(|y| record.date.year() == y);
        let matches_category = self.category.as_ref().is_none_or(|c| &record.category == c);
        let matches_date = self.date.is_none_or(|d| record.date == d);

        matches_search && matches_year && matches_category && matches_date
    }
}

/// Values the year and category filters can take.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Newest first.
    pub years: Vec<i32>,
    /// Alphabetical.
    pub categories: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[Record]) -> Self {
        let years: BTreeSet<i32> = records.iter().map(Record::year).collect();
        let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
        Self {
            years: years.into_iter().rev().collect(),
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Why a catalog shows no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing archived yet.
    NoRecords,
    /// Records exist but the filters exclude all of them.
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogView {
    pub records: Vec<DisplayRecord>,
    pub options: FilterOptions,
    pub layout: Layout,
    pub empty: Option<EmptyState>,
    pub total: usize,
}

/// Index every record, then keep the ones the filter accepts.
pub fn project(records: Vec<Record>, filter: &CatalogFilter, layout: Layout) -> CatalogView {
    let options = FilterOptions::from_records(&records);
    let total = records.len();
    let visible: Vec<DisplayRecord> = index_records(records)
        .into_iter()
        .filter(|dr| filter.matches(&dr.record))
        .collect();

    let empty = match (total, visible.len()) {
        (0, _) => Some(EmptyState::NoRecords),
        (_, 0) => Some(EmptyState::NoMatches),
        _ => None,
    };

    CatalogView {
        records: visible,
        options,
        layout,
        empty,
        total,
    }
}

/// One bar of the per-category chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartBar {
    pub label: String,
    pub count: usize,
    /// Bar length in cells, proportional to the largest count.
    pub len: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub categories: usize,
    pub years: usize,
    /// Count per category, alphabetical.
    pub per_category: Vec<(String, usize)>,
}

impl CatalogStats {
    pub fn from_records(records: &[Record]) -> Self {
        let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
        let mut years = BTreeSet::new();
        for record in records {
            *per_category.entry(record.category.as_str()).or_default() += 1;
            years.insert(record.year());
        }
        Self {
            total: records.len(),
            categories: per_category.len(),
            years: years.len(),
            per_category: per_category
                .into_iter()
                .map(|(c, n)| (c.to_string(), n))
                .collect(),
        }
    }

    /// Bars scaled so the largest category spans `width` cells.
    /// Empty when there is nothing to chart.
    pub fn chart(&self, width: usize) -> Vec<ChartBar> {
        let max = self.per_category.iter().map(|(_, n)| *n).max().unwrap_or(0);
        if max == 0 {
            return Vec::new();
        }
        self.per_category
            .iter()
            .map(|(label, count)| ChartBar {
                label: label.clone(),
                count: *count,
                len: (count * width).div_ceil(max).max(1),
            })
            .collect()
    }
}

/// Category label as shown in option lists: first letter upper-cased.
pub fn category_label(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! # Record Identifiers: Id vs Display Index
//!
//! Records are keyed by a [`RecordId`] (the upload timestamp in milliseconds).
//! That is a fine primary key but a poor thing to type, so the catalog numbers
//! records `1..n` and every per-record command accepts those numbers.
//!
//! ## Canonical Ordering
//!
//! Numbers come from the full, unfiltered record list sorted by
//! `upload_timestamp` descending (newest = 1), ties broken by id descending.
//! Filtering never renumbers: `diarch delete 2` targets the same record
//! whether or not `--category Work` was used to find it.
//!
//! ## Selectors
//!
//! A selector is one of:
//! - a display index: `3`
//! - an inclusive range of display indexes: `2-4`
//! - a literal record id: `1682899200123`, `legacy_7`
//!
//! Short all-digit input is an index. Anything else that is a valid id is
//! treated as one. Thirteen-digit timestamps are long enough to never collide
//! with an index, but migrated records may carry short numeric ids such as
//! `5`: when a record's id is exactly the typed number, the id wins over the
//! display index. Ranges always count display indexes.
//!
//! **Developer Note**: list/view commands go through [`index_records`]; never
//! enumerate a record list by hand.

use crate::error::{DiarchError, Result};
use crate::model::{Record, RecordId};
use std::fmt;
use std::str::FromStr;

/// All-digit input shorter than this is a display index, longer is an id.
const MAX_INDEX_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRecord {
    pub record: Record,
    pub index: usize,
}

/// A user input that selects one or more records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSelector {
    Index(usize),
    Range(usize, usize),
    Id(RecordId),
}

impl fmt::Display for RecordSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSelector::Index(i) => write!(f, "{}", i),
            RecordSelector::Range(start, end) => write!(f, "{}-{}", start, end),
            RecordSelector::Id(id) => write!(f, "{}", id),
        }
    }
}

fn as_index(s: &str) -> Option<usize> {
    if !s.is_empty() && s.len() < MAX_INDEX_DIGITS && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

impl FromStr for RecordSelector {
    type Err = DiarchError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(n) = as_index(s) {
            return Ok(RecordSelector::Index(n));
        }
        if let Some((start, end)) = s.split_once('-') {
            if let (Some(start), Some(end)) = (as_index(start), as_index(end)) {
                return Ok(RecordSelector::Range(start, end));
            }
        }
        RecordId::parse(s)
            .map(RecordSelector::Id)
            .map_err(|_| DiarchError::InvalidSelector(format!("'{}' is not an index, range or id", s)))
    }
}

/// Sort records into canonical order and number them from 1.
pub fn index_records(mut records: Vec<Record>) -> Vec<DisplayRecord> {
    records.sort_by(|a, b| {
        b.upload_timestamp
            .cmp(&a.upload_timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| DisplayRecord {
            record,
            index: i + 1,
        })
        .collect()
}

/// Resolve selectors against an indexed list, in selector order, without repeats.
pub fn resolve<'a>(
    indexed: &'a [DisplayRecord],
    selectors: &[RecordSelector],
) -> Result<Vec<&'a DisplayRecord>> {
    let find_index = |i: usize| {
        indexed
            .iter()
            .find(|dr| dr.index == i)
            .ok_or_else(|| DiarchError::InvalidSelector(format!("Index {} not found", i)))
    };

    let mut results: Vec<&DisplayRecord> = Vec::new();
    let mut push = |dr: &'a DisplayRecord| {
        if !results.iter().any(|r| r.record.id == dr.record.id) {
            results.push(dr);
        }
    };

    for selector in selectors {
        match selector {
            RecordSelector::Index(i) => {
                let key = i.to_string();
                let by_id = indexed.iter().find(|dr| dr.record.id.as_str() == key);
                match by_id {
                    Some(dr) => push(dr),
                    None => push(find_index(*i)?),
                }
            }
            RecordSelector::Range(start, end) => {
                if start > end {
                    return Err(DiarchError::InvalidSelector(format!(
                        "Invalid range: {} is after {}",
                        start, end
                    )));
                }
                find_index(*start)?;
                find_index(*end)?;
                for i in *start..=*end {
                    push(find_index(i)?);
                }
            }
            RecordSelector::Id(id) => {
                let dr = indexed
                    .iter()
                    .find(|dr| &dr.record.id == id)
                    .ok_or_else(|| DiarchError::RecordNotFound(id.clone()))?;
                push(dr);
            }
        }
    }

    Ok(results)
}

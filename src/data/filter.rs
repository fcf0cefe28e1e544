use std::collections::BTreeSet;

use super::error::DashboardError;
use super::model::{Coordinates, DelayTable, OriginClass, Record};

// ---------------------------------------------------------------------------
// Filter parameters
// ---------------------------------------------------------------------------

/// Inclusive hour-of-day window. Always satisfies `min <= max <= 23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    min: u8,
    max: u8,
}

impl HourRange {
    pub const FULL_DAY: HourRange = HourRange { min: 0, max: 23 };
    /// Initial selection of the dashboard.
    pub const DAYTIME: HourRange = HourRange { min: 6, max: 22 };

    pub fn new(min: u8, max: u8) -> Result<Self, DashboardError> {
        if min > max || max > 23 {
            return Err(DashboardError::InvalidFilterRange { min, max });
        }
        Ok(HourRange { min, max })
    }

    pub const fn min(&self) -> u8 {
        self.min
    }

    pub const fn max(&self) -> u8 {
        self.max
    }

    pub fn contains(&self, hour: u8) -> bool {
        (self.min..=self.max).contains(&hour)
    }
}

/// The three user-chosen predicates, combined with logical AND.
///
/// Empty origin or category sets select nothing; they never mean "no filter".
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub hours: HourRange,
    pub origins: BTreeSet<OriginClass>,
    pub categories: BTreeSet<String>,
}

impl FilterParams {
    /// Everything in `table` selected, with the given hour window.
    pub fn all_of(table: &DelayTable, hours: HourRange) -> Self {
        FilterParams {
            hours,
            origins: OriginClass::ALL.into_iter().collect(),
            categories: table.train_categories().clone(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.hours.contains(record.hour)
            && self.origins.contains(&record.origin)
            && self.categories.contains(&record.train_category)
    }
}

// ---------------------------------------------------------------------------
// FilteredTable – rows of the raw table passing the current filters
// ---------------------------------------------------------------------------

/// A read-only view over the rows of a [`DelayTable`] that passed a filter.
///
/// Only row indices are stored; the raw records are borrowed, never copied.
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    source: &'a DelayTable,
    rows: Vec<usize>,
}

impl<'a> FilteredTable<'a> {
    /// View every row of `table`.
    pub fn all(table: &'a DelayTable) -> Self {
        FilteredTable {
            source: table,
            rows: (0..table.len()).collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.source.records();
        self.rows.iter().map(move |&i| &records[i])
    }

    /// Indices of the passing rows within the raw table, ascending.
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    /// Station coordinates from the raw table, independent of the filter.
    pub fn coordinates(&self, stop_name: &str) -> Option<Coordinates> {
        self.source.coordinates(stop_name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Return the rows of `table` that pass all three predicates.
pub fn filter<'a>(table: &'a DelayTable, params: &FilterParams) -> FilteredTable<'a> {
    let rows = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| params.matches(rec))
        .map(|(i, _)| i)
        .collect();
    FilteredTable {
        source: table,
        rows,
    }
}

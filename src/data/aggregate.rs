//! The four chart tables derived from a filtered view.
//!
//! Every function here is pure: same view in, bit-identical table out.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::filter::FilteredTable;
use super::model::Coordinates;

/// Round half-to-even at `decimals` places, the way NumPy rounds.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Runs per distinct date, averaged over the dates seen.
fn mean_daily(runs_per_date: &BTreeMap<NaiveDate, usize>) -> f64 {
    if runs_per_date.is_empty() {
        return 0.0;
    }
    let total: usize = runs_per_date.values().sum();
    total as f64 / runs_per_date.len() as f64
}

/// Share of delayed runs.
fn rate(delayed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    delayed as f64 / total as f64
}

// ---------------------------------------------------------------------------
// (a) Station load and delay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct StationSummary {
    pub stop_name: String,
    pub coordinates: Coordinates,
    /// Runs per day, averaged over the dates on which the station saw a run.
    pub mean_daily_runs: f64,
    /// Share of delayed runs over all filtered rows, two decimals.
    pub delay_rate: f64,
}

#[derive(Default)]
struct StationAcc {
    per_date: BTreeMap<NaiveDate, usize>,
    delayed: usize,
    total: usize,
}

/// One row per station present in the view.
///
/// The daily mean is normalised by date; the delay rate is a flat mean over
/// all of the station's rows.
pub fn station_summary(view: &FilteredTable<'_>) -> Vec<StationSummary> {
    let mut acc: BTreeMap<&str, StationAcc> = BTreeMap::new();
    for rec in view.records() {
        let entry = acc.entry(rec.stop_name.as_str()).or_default();
        *entry.per_date.entry(rec.date).or_default() += 1;
        entry.total += 1;
        if rec.is_delayed {
            entry.delayed += 1;
        }
    }

    acc.into_iter()
        .filter_map(|(stop, a)| {
            let coordinates = view.coordinates(stop)?;
            Some(StationSummary {
                stop_name: stop.to_string(),
                coordinates,
                mean_daily_runs: mean_daily(&a.per_date),
                delay_rate: round_to(rate(a.delayed, a.total), 2),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// (b) Category throughput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryThroughput {
    pub train_category: String,
    /// Runs per day, averaged over the dates with at least one run, rounded.
    pub mean_daily_runs: u64,
}

pub fn category_throughput(view: &FilteredTable<'_>) -> Vec<CategoryThroughput> {
    let mut per_category: BTreeMap<&str, BTreeMap<NaiveDate, usize>> = BTreeMap::new();
    for rec in view.records() {
        *per_category
            .entry(rec.train_category.as_str())
            .or_default()
            .entry(rec.date)
            .or_default() += 1;
    }

    per_category
        .into_iter()
        .map(|(category, per_date)| CategoryThroughput {
            train_category: category.to_string(),
            mean_daily_runs: round_to(mean_daily(&per_date), 0) as u64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// (c) Category delay rate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDelayRate {
    pub train_category: String,
    pub delay_rate: f64,
}

pub fn category_delay_rate(view: &FilteredTable<'_>) -> Vec<CategoryDelayRate> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for rec in view.records() {
        let (delayed, total) = counts.entry(rec.train_category.as_str()).or_default();
        *total += 1;
        if rec.is_delayed {
            *delayed += 1;
        }
    }

    counts
        .into_iter()
        .map(|(category, (delayed, total))| CategoryDelayRate {
            train_category: category.to_string(),
            delay_rate: round_to(rate(delayed, total), 2),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// (d) Hourly delay-category histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyDelayCount {
    pub hour: u8,
    pub delay_category: String,
    pub count: usize,
}

/// Sparse (hour, delay category) counts. Rows without a delay category are
/// not counted and unseen combinations are omitted.
pub fn hourly_delay_histogram(view: &FilteredTable<'_>) -> Vec<HourlyDelayCount> {
    let mut counts: BTreeMap<(u8, &str), usize> = BTreeMap::new();
    for rec in view.records() {
        if let Some(cat) = rec.delay_category.as_deref() {
            *counts.entry((rec.hour, cat)).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|((hour, cat), count)| HourlyDelayCount {
            hour,
            delay_category: cat.to_string(),
            count,
        })
        .collect()
}

/// Expand the sparse histogram into one dense 24-hour series per delay
/// category, with missing hours as zero.
pub fn dense_hourly_series(histogram: &[HourlyDelayCount]) -> BTreeMap<String, [usize; 24]> {
    let categories: BTreeSet<&str> = histogram.iter().map(|h| h.delay_category.as_str()).collect();
    let mut series: BTreeMap<String, [usize; 24]> = categories
        .into_iter()
        .map(|c| (c.to_string(), [0; 24]))
        .collect();
    for h in histogram {
        if let Some(counts) = series.get_mut(&h.delay_category) {
            counts[h.hour as usize] = h.count;
        }
    }
    series
}

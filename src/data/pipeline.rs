use std::time::Instant;

use super::aggregate::{
    category_delay_rate, category_throughput, hourly_delay_histogram, station_summary,
    CategoryDelayRate, CategoryThroughput, HourlyDelayCount, StationSummary,
};
use super::filter::{filter, FilterParams, FilteredTable};
use super::model::DelayTable;

/// The four chart tables produced by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardAggregates {
    pub stations: Vec<StationSummary>,
    pub category_throughput: Vec<CategoryThroughput>,
    pub category_delay_rates: Vec<CategoryDelayRate>,
    pub hourly_delays: Vec<HourlyDelayCount>,
    /// Rows that passed the filter.
    pub row_count: usize,
}

impl DashboardAggregates {
    /// Derive all four tables from an already filtered view.
    pub fn compute(view: &FilteredTable<'_>) -> Self {
        DashboardAggregates {
            stations: station_summary(view),
            category_throughput: category_throughput(view),
            category_delay_rates: category_delay_rate(view),
            hourly_delays: hourly_delay_histogram(view),
            row_count: view.len(),
        }
    }

    /// Filter the raw table and derive all four tables.
    pub fn run(table: &DelayTable, params: &FilterParams) -> Self {
        let started = Instant::now();
        let view = filter(table, params);
        let aggregates = Self::compute(&view);
        log::debug!(
            "Pipeline: {} of {} rows, hours {}..={}, {} origin(s), {} categories, {:?}",
            view.len(),
            table.len(),
            params.hours.min(),
            params.hours.max(),
            params.origins.len(),
            params.categories.len(),
            started.elapsed()
        );
        aggregates
    }

    /// Nothing passed the filter; charts show placeholders.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::HourRange;
    use crate::data::model::tests::rec;
    use crate::data::model::OriginClass::{Domestic, International};

    fn table() -> DelayTable {
        DelayTable::from_records(vec![
            rec("Bern", (2022, 11, 3), 8, Domestic, "IC", true, Some("3-5 min")),
            rec("Bern", (2022, 11, 3), 5, Domestic, "S", false, None),
            rec("Zürich HB", (2022, 11, 4), 22, International, "EC", true, Some("> 5 min")),
        ])
    }

    #[test]
    fn run_filters_then_aggregates() {
        let table = table();
        let params = FilterParams::all_of(&table, HourRange::new(6, 22).unwrap());
        let out = DashboardAggregates::run(&table, &params);
        assert_eq!(out.row_count, 2);
        assert_eq!(out.stations.len(), 2);
        assert!(out.category_throughput.iter().all(|t| t.train_category != "S"));
        assert_eq!(out.hourly_delays.len(), 2);
    }

    #[test]
    fn run_is_idempotent() {
        let table = table();
        let params = FilterParams::all_of(&table, HourRange::FULL_DAY);
        let first = DashboardAggregates::run(&table, &params);
        let second = DashboardAggregates::run(&table, &params);
        assert_eq!(first, second);
        for (a, b) in first.stations.iter().zip(&second.stations) {
            assert_eq!(a.mean_daily_runs.to_bits(), b.mean_daily_runs.to_bits());
            assert_eq!(a.delay_rate.to_bits(), b.delay_rate.to_bits());
        }
    }

    #[test]
    fn empty_selection_degrades_to_empty_tables() {
        let table = table();
        let mut params = FilterParams::all_of(&table, HourRange::FULL_DAY);
        params.categories.clear();
        let out = DashboardAggregates::run(&table, &params);
        assert!(out.is_empty());
        assert_eq!(out, DashboardAggregates::default());
    }
}

use std::collections::BTreeSet;
use std::path::PathBuf;

use sbb_delays::config::DashboardConfig;
use sbb_delays::data::error::DashboardError;
use sbb_delays::data::filter::{filter, FilterParams, HourRange};
use sbb_delays::data::loader::load_file;
use sbb_delays::data::model::{DelayTable, OriginClass};
use sbb_delays::data::pipeline::DashboardAggregates;

fn fixture() -> DelayTable {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/delays.csv");
    load_file(&path).expect("fixture loads")
}

fn default_params(table: &DelayTable) -> FilterParams {
    let hours = DashboardConfig::default().default_hour_range().unwrap();
    FilterParams::all_of(table, hours)
}

#[test]
fn test_default_dashboard() {
    let table = fixture();
    assert_eq!(table.len(), 10);

    let out = DashboardAggregates::run(&table, &default_params(&table));
    assert_eq!(out.row_count, 8);

    let names: Vec<&str> = out.stations.iter().map(|s| s.stop_name.as_str()).collect();
    assert_eq!(names, vec!["Bern", "Olten", "Zürich HB"]);

    let bern = &out.stations[0];
    assert_eq!(bern.mean_daily_runs, 1.5);
    assert_eq!(bern.delay_rate, 0.67);

    let zurich = &out.stations[2];
    assert_eq!(zurich.mean_daily_runs, 4.0 / 3.0);
    assert_eq!(zurich.delay_rate, 0.5);

    let throughput: Vec<(&str, u64)> = out
        .category_throughput
        .iter()
        .map(|t| (t.train_category.as_str(), t.mean_daily_runs))
        .collect();
    assert_eq!(throughput, vec![("EC", 1), ("IC", 2), ("IR", 2), ("S", 2)]);

    let rates: Vec<(&str, f64)> = out
        .category_delay_rates
        .iter()
        .map(|r| (r.train_category.as_str(), r.delay_rate))
        .collect();
    assert_eq!(rates, vec![("EC", 1.0), ("IC", 0.5), ("IR", 0.0), ("S", 0.5)]);

    let histogram: Vec<(u8, &str, usize)> = out
        .hourly_delays
        .iter()
        .map(|h| (h.hour, h.delay_category.as_str(), h.count))
        .collect();
    assert_eq!(
        histogram,
        vec![(6, "3-5 min", 1), (7, "3-5 min", 1), (8, "> 15 min", 1), (22, "5-15 min", 1)]
    );
}

#[test]
fn test_single_hour_and_full_day() {
    let table = fixture();
    let mut params = default_params(&table);

    params.hours = HourRange::new(8, 8).unwrap();
    let view = filter(&table, &params);
    assert_eq!(view.len(), 2);
    assert!(view.records().all(|r| r.hour == 8));

    params.hours = HourRange::FULL_DAY;
    assert_eq!(filter(&table, &params).len(), table.len());
}

#[test]
fn test_origin_selection() {
    let table = fixture();
    let mut params = default_params(&table);

    params.origins = BTreeSet::from([OriginClass::International]);
    let out = DashboardAggregates::run(&table, &params);
    assert_eq!(out.row_count, 2);
    assert!(out.category_throughput.iter().all(|t| t.train_category == "EC"));

    params.origins.clear();
    let out = DashboardAggregates::run(&table, &params);
    assert!(out.is_empty());
    assert!(out.stations.is_empty());
    assert!(out.hourly_delays.is_empty());
}

#[test]
fn test_station_coordinates_ignore_filters() {
    let table = fixture();
    let all = DashboardAggregates::run(&table, &FilterParams::all_of(&table, HourRange::FULL_DAY));

    for (min, max) in [(5, 5), (6, 8), (17, 23)] {
        let params = FilterParams::all_of(&table, HourRange::new(min, max).unwrap());
        for station in DashboardAggregates::run(&table, &params).stations {
            let reference = all
                .stations
                .iter()
                .find(|s| s.stop_name == station.stop_name)
                .unwrap();
            assert_eq!(station.coordinates, reference.coordinates);
        }
    }
}

#[test]
fn test_rates_are_two_decimal_shares() {
    let table = fixture();
    let out = DashboardAggregates::run(&table, &FilterParams::all_of(&table, HourRange::FULL_DAY));
    let rates = out
        .stations
        .iter()
        .map(|s| s.delay_rate)
        .chain(out.category_delay_rates.iter().map(|r| r.delay_rate));
    for rate in rates {
        assert!((0.0..=1.0).contains(&rate));
        assert_eq!((rate * 100.0).round() / 100.0, rate);
    }
}

#[test]
fn test_inverted_range_is_rejected() {
    assert_eq!(
        HourRange::new(22, 6),
        Err(DashboardError::InvalidFilterRange { min: 22, max: 6 })
    );
}

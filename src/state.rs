use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sbb_delays::config::DashboardConfig;
use sbb_delays::data::error::DashboardError;
use sbb_delays::data::filter::{FilterParams, HourRange};
use sbb_delays::data::loader::load_file;
use sbb_delays::data::model::{DelayTable, OriginClass};
use sbb_delays::data::pipeline::DashboardAggregates;

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Raw dataset (None until a file loaded successfully).
    pub table: Option<DelayTable>,

    /// File the current table was read from.
    pub source_path: Option<PathBuf>,

    /// Fatal error from the startup load, shown instead of the charts.
    pub load_error: Option<String>,

    /// Non-fatal status / error message shown in the top bar.
    pub status_message: Option<String>,

    // -- Filter selections --
    pub hour_min: u8,
    pub hour_max: u8,
    pub origins: BTreeSet<OriginClass>,
    pub categories: BTreeSet<String>,

    /// Chart tables for the current selections.
    pub aggregates: DashboardAggregates,

    /// Stable colours per train category and per delay category.
    pub category_colors: ColorMap,
    pub delay_colors: ColorMap,

    /// When the selections last changed without a pipeline run.
    pending_since: Option<Instant>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let [hour_min, hour_max] = config.default_hours;
        Self {
            config,
            table: None,
            source_path: None,
            load_error: None,
            status_message: None,
            hour_min,
            hour_max,
            origins: OriginClass::ALL.into_iter().collect(),
            categories: BTreeSet::new(),
            aggregates: DashboardAggregates::default(),
            category_colors: ColorMap::default(),
            delay_colors: ColorMap::default(),
            pending_since: None,
        }
    }

    /// Load the configured dataset. Failure is fatal for the session view.
    pub fn load_startup(&mut self) {
        let path = self.config.data_path.clone();
        if let Err(e) = self.open(&path) {
            log::error!("Failed to load {}: {e}", path.display());
            self.load_error = Some(e.to_string());
        }
    }

    /// Replace the dataset with the contents of `path`. On failure the
    /// current dataset stays loaded.
    pub fn open(&mut self, path: &Path) -> Result<(), DashboardError> {
        let table = load_file(path)?;
        self.set_table(table, path.to_path_buf());
        Ok(())
    }

    /// Ingest a newly loaded dataset, reset filters and colours, and run the
    /// pipeline once.
    pub fn set_table(&mut self, table: DelayTable, path: PathBuf) {
        let hours = self.config.default_hour_range().unwrap_or_else(|e| {
            log::warn!("Configured default hours rejected ({e}); using 6..=22");
            HourRange::DAYTIME
        });
        let params = FilterParams::all_of(&table, hours);

        self.hour_min = hours.min();
        self.hour_max = hours.max();
        self.origins = params.origins;
        self.categories = params.categories;
        self.category_colors = ColorMap::new(table.train_categories());
        self.delay_colors = ColorMap::new(table.delay_categories());

        self.table = Some(table);
        self.source_path = Some(path);
        self.load_error = None;
        self.status_message = None;
        self.recompute();
    }

    /// The current selections as pipeline parameters.
    pub fn filter_params(&self) -> Result<FilterParams, DashboardError> {
        Ok(FilterParams {
            hours: HourRange::new(self.hour_min, self.hour_max)?,
            origins: self.origins.clone(),
            categories: self.categories.clone(),
        })
    }

    /// File name of the loaded dataset, for the status line.
    pub fn source_name(&self) -> Option<String> {
        let path = self.source_path.as_deref()?;
        let name = path.file_name().unwrap_or(path.as_os_str());
        Some(name.to_string_lossy().into_owned())
    }

    /// Run the pipeline now.
    pub fn recompute(&mut self) {
        self.pending_since = None;
        let Some(table) = &self.table else {
            return;
        };
        match self.filter_params() {
            Ok(params) => self.aggregates = DashboardAggregates::run(table, &params),
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Record a selection change; the pipeline runs once the debounce
    /// period has passed without further changes.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Run a pending recomputation if its quiet period is over. Returns how
    /// long to wait before polling again when one is still pending.
    pub fn poll_recompute(&mut self, now: Instant) -> Option<Duration> {
        let since = self.pending_since?;
        let waited = now.saturating_duration_since(since);
        let debounce = self.config.debounce();
        if waited >= debounce {
            self.recompute();
            None
        } else {
            Some(debounce - waited)
        }
    }

    // -- Selection edits --

    /// Set the hour window. The bounds are kept ordered, so an inverted
    /// range never reaches the pipeline.
    pub fn set_hours(&mut self, min: u8, max: u8, now: Instant) {
        let max = max.min(23);
        let min = min.min(max);
        if (min, max) != (self.hour_min, self.hour_max) {
            self.hour_min = min;
            self.hour_max = max;
            self.mark_dirty(now);
        }
    }

    pub fn set_origin(&mut self, origin: OriginClass, selected: bool, now: Instant) {
        let changed = if selected {
            self.origins.insert(origin)
        } else {
            self.origins.remove(&origin)
        };
        if changed {
            self.mark_dirty(now);
        }
    }

    pub fn set_category(&mut self, category: &str, selected: bool, now: Instant) {
        let changed = if selected {
            self.categories.insert(category.to_string())
        } else {
            self.categories.remove(category)
        };
        if changed {
            self.mark_dirty(now);
        }
    }

    /// Select all train categories present in the dataset.
    pub fn select_all_categories(&mut self, now: Instant) {
        if let Some(table) = &self.table {
            self.categories = table.train_categories().clone();
            self.mark_dirty(now);
        }
    }

    /// Deselect all train categories.
    pub fn select_no_categories(&mut self, now: Instant) {
        self.categories.clear();
        self.mark_dirty(now);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sbb_delays::data::model::{Coordinates, Record};

    use super::*;

    fn record(stop: &str, hour: u8, category: &str, delayed: bool) -> Record {
        Record {
            stop_name: stop.to_string(),
            coordinates: Coordinates {
                latitude: 46.9,
                longitude: 7.4,
            },
            date: NaiveDate::from_ymd_opt(2022, 11, 3).unwrap(),
            hour,
            origin: OriginClass::Domestic,
            train_category: category.to_string(),
            line_id: "1".into(),
            is_delayed: delayed,
            delay_category: delayed.then(|| "3-5 min".to_string()),
        }
    }

    fn loaded_state(debounce_ms: u64) -> AppState {
        let config = DashboardConfig {
            debounce_ms,
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        let table = DelayTable::from_records(vec![
            record("Bern", 8, "IC", true),
            record("Bern", 5, "S", false),
            record("Olten", 12, "S", true),
        ]);
        state.set_table(table, PathBuf::from("memory"));
        state
    }

    #[test]
    fn new_table_selects_defaults_and_computes() {
        let state = loaded_state(150);
        assert_eq!((state.hour_min, state.hour_max), (6, 22));
        assert_eq!(state.origins.len(), 2);
        assert_eq!(state.categories.len(), 2);
        assert_eq!(state.aggregates.row_count, 2);
        assert!(!state.is_dirty());
    }

    #[test]
    fn rapid_changes_collapse_into_one_run() {
        let mut state = loaded_state(150);
        let t0 = Instant::now();

        state.set_hours(0, 23, t0);
        state.set_category("IC", false, t0 + Duration::from_millis(50));
        assert_eq!(state.aggregates.row_count, 2);

        let wait = state.poll_recompute(t0 + Duration::from_millis(100));
        assert_eq!(wait, Some(Duration::from_millis(100)));
        assert_eq!(state.aggregates.row_count, 2);

        assert_eq!(state.poll_recompute(t0 + Duration::from_millis(200)), None);
        assert!(!state.is_dirty());
        // Hours 0..=23 with IC removed: the two S runs.
        assert_eq!(state.aggregates.row_count, 2);
        assert!(state
            .aggregates
            .category_throughput
            .iter()
            .all(|t| t.train_category == "S"));
    }

    #[test]
    fn zero_debounce_runs_on_next_poll() {
        let mut state = loaded_state(0);
        let now = Instant::now();
        state.select_no_categories(now);
        assert_eq!(state.poll_recompute(now), None);
        assert!(state.aggregates.is_empty());

        state.select_all_categories(now);
        state.poll_recompute(now);
        assert_eq!(state.aggregates.row_count, 2);
    }

    #[test]
    fn hour_bounds_stay_ordered() {
        let mut state = loaded_state(0);
        state.set_hours(20, 10, Instant::now());
        assert!(state.hour_min <= state.hour_max);
        assert!(state.filter_params().is_ok());
    }

    #[test]
    fn unchanged_selection_does_not_mark_dirty() {
        let mut state = loaded_state(0);
        state.set_origin(OriginClass::Domestic, true, Instant::now());
        state.set_hours(6, 22, Instant::now());
        assert!(!state.is_dirty());
    }

    #[test]
    fn invalid_default_hours_do_not_discard_the_dataset() {
        let config = DashboardConfig {
            default_hours: [22, 6],
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        let table = DelayTable::from_records(vec![record("Bern", 8, "IC", true)]);
        state.set_table(table, PathBuf::from("/data/delays.parquet"));

        assert!(state.table.is_some());
        assert!(state.load_error.is_none());
        assert_eq!((state.hour_min, state.hour_max), (6, 22));
        assert_eq!(state.aggregates.row_count, 1);
    }

    #[test]
    fn source_name_is_the_file_name() {
        let mut state = loaded_state(0);
        assert_eq!(state.source_name().as_deref(), Some("memory"));
        let table = DelayTable::from_records(vec![record("Bern", 8, "IC", true)]);
        state.set_table(table, PathBuf::from("/data/delays.parquet"));
        assert_eq!(state.source_name().as_deref(), Some("delays.parquet"));
    }

    #[test]
    fn failed_open_keeps_current_dataset() {
        let mut state = loaded_state(0);
        let err = state.open(Path::new("/nonexistent/data.parquet")).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
        assert!(state.table.is_some());
        assert_eq!(state.source_path.as_deref(), Some(Path::new("memory")));
    }
}

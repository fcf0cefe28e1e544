use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::error::DashboardError;
use super::schema::Column;

// ---------------------------------------------------------------------------
// CellValue – a single untyped cell as read from a source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a Pandas export can carry.
/// Readers produce these; [`Record::from_cells`] coerces them into typed fields.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Str(s) => write!(f, "{s:?}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Best-effort typing of a text cell (CSV has no dtypes).
    pub fn guess(s: &str) -> CellValue {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        match s {
            "true" | "True" => CellValue::Bool(true),
            "false" | "False" => CellValue::Bool(false),
            _ => CellValue::Str(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// OriginClass
// ---------------------------------------------------------------------------

/// Whether a run's first stop was in Switzerland or abroad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OriginClass {
    Domestic,
    International,
}

impl OriginClass {
    pub const ALL: [OriginClass; 2] = [OriginClass::Domestic, OriginClass::International];

    pub fn label(self) -> &'static str {
        match self {
            OriginClass::Domestic => "domestic",
            OriginClass::International => "international",
        }
    }
}

impl fmt::Display for OriginClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OriginClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "domestic" | "schweiz" => Ok(OriginClass::Domestic),
            "international" | "ausland" => Ok(OriginClass::International),
            other => Err(format!("unknown origin class '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One observed run of a train at a station.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub stop_name: String,
    pub coordinates: Coordinates,
    pub date: NaiveDate,
    /// Hour-of-day bucket, always in 0..=23.
    pub hour: u8,
    pub origin: OriginClass,
    pub train_category: String,
    pub line_id: String,
    pub is_delayed: bool,
    pub delay_category: Option<String>,
}

impl Record {
    /// Build a record from one source row.
    ///
    /// `cell` yields the raw value of a schema column; `row` is only used to
    /// locate errors.
    pub fn from_cells<F>(row: usize, mut cell: F) -> Result<Record, DashboardError>
    where
        F: FnMut(Column) -> CellValue,
    {
        let mut take = |column: Column| {
            let value = cell(column);
            if value == CellValue::Null && !column.is_nullable() {
                return Err(invalid(row, column, "null value"));
            }
            Ok(value)
        };

        let stop_name = as_text(row, Column::StopName, take(Column::StopName)?)?;
        let latitude = as_float(row, Column::Latitude, take(Column::Latitude)?)?;
        let longitude = as_float(row, Column::Longitude, take(Column::Longitude)?)?;
        let date = as_date(row, take(Column::Date)?)?;
        let hour = as_hour(row, take(Column::Hour)?)?;
        let origin = as_text(row, Column::OriginClass, take(Column::OriginClass)?)?
            .parse::<OriginClass>()
            .map_err(|e| invalid(row, Column::OriginClass, e))?;
        let train_category = as_text(row, Column::TrainCategory, take(Column::TrainCategory)?)?;
        let line_id = as_text(row, Column::LineId, take(Column::LineId)?)?;
        let is_delayed = as_bool(row, take(Column::IsDelayed)?)?;
        let delay_category = match take(Column::DelayCategory)? {
            CellValue::Null => None,
            other => Some(as_text(row, Column::DelayCategory, other)?),
        };

        Ok(Record {
            stop_name,
            coordinates: Coordinates {
                latitude,
                longitude,
            },
            date,
            hour,
            origin,
            train_category,
            line_id,
            is_delayed,
            delay_category,
        })
    }
}

// -- Coercion helpers --

fn invalid(row: usize, column: Column, reason: impl ToString) -> DashboardError {
    DashboardError::InvalidValue {
        row,
        column: column.name(),
        reason: reason.to_string(),
    }
}

fn as_text(row: usize, column: Column, value: CellValue) -> Result<String, DashboardError> {
    match value {
        CellValue::Str(s) => Ok(s),
        CellValue::Int(i) => Ok(i.to_string()),
        other => Err(invalid(row, column, format!("expected text, got {other}"))),
    }
}

fn as_float(row: usize, column: Column, value: CellValue) -> Result<f64, DashboardError> {
    let v = match value {
        CellValue::Float(v) => v,
        CellValue::Int(i) => i as f64,
        CellValue::Str(ref s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(row, column, format!("expected number, got {value}")))?,
        other => return Err(invalid(row, column, format!("expected number, got {other}"))),
    };
    if !v.is_finite() {
        return Err(invalid(row, column, "non-finite number"));
    }
    Ok(v)
}

fn as_date(row: usize, value: CellValue) -> Result<NaiveDate, DashboardError> {
    match value {
        CellValue::Date(d) => Ok(d),
        CellValue::Str(ref s) => {
            // Accept "2022-11-03" as well as "2022-11-03 00:00:00" / "2022-11-03T00:00:00".
            let day = s.trim().get(..10).unwrap_or(s.trim());
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|_| invalid(row, Column::Date, format!("expected YYYY-MM-DD, got {value}")))
        }
        other => Err(invalid(row, Column::Date, format!("expected date, got {other}"))),
    }
}

fn as_hour(row: usize, value: CellValue) -> Result<u8, DashboardError> {
    let hour = match value {
        CellValue::Int(i) => i,
        CellValue::Float(v) if v.fract() == 0.0 => v as i64,
        other => return Err(invalid(row, Column::Hour, format!("expected integer hour, got {other}"))),
    };
    if !(0..=23).contains(&hour) {
        return Err(invalid(row, Column::Hour, format!("hour {hour} outside 0..=23")));
    }
    Ok(hour as u8)
}

fn as_bool(row: usize, value: CellValue) -> Result<bool, DashboardError> {
    match value {
        CellValue::Bool(b) => Ok(b),
        CellValue::Int(0) => Ok(false),
        CellValue::Int(1) => Ok(true),
        CellValue::Float(v) if v == 0.0 => Ok(false),
        CellValue::Float(v) if v == 1.0 => Ok(true),
        CellValue::Str(ref s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(invalid(row, Column::IsDelayed, format!("expected boolean, got {value}"))),
        },
        other => Err(invalid(row, Column::IsDelayed, format!("expected boolean, got {other}"))),
    }
}

// ---------------------------------------------------------------------------
// DelayTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The immutable raw table plus indices computed once at load time.
#[derive(Debug, Clone)]
pub struct DelayTable {
    records: Vec<Record>,
    /// Representative coordinates per station (first observed pair).
    stations: BTreeMap<String, Coordinates>,
    train_categories: BTreeSet<String>,
    delay_categories: BTreeSet<String>,
    date_span: Option<(NaiveDate, NaiveDate)>,
    coordinate_conflicts: usize,
}

impl DelayTable {
    /// Build the table and its indices from loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut stations: BTreeMap<String, Coordinates> = BTreeMap::new();
        let mut train_categories = BTreeSet::new();
        let mut delay_categories = BTreeSet::new();
        let mut date_span: Option<(NaiveDate, NaiveDate)> = None;
        let mut coordinate_conflicts = 0;

        for rec in &records {
            match stations.get(&rec.stop_name) {
                Some(existing) if *existing != rec.coordinates => coordinate_conflicts += 1,
                Some(_) => {}
                None => {
                    stations.insert(rec.stop_name.clone(), rec.coordinates);
                }
            }
            if !train_categories.contains(&rec.train_category) {
                train_categories.insert(rec.train_category.clone());
            }
            if let Some(cat) = &rec.delay_category {
                if !delay_categories.contains(cat) {
                    delay_categories.insert(cat.clone());
                }
            }
            date_span = Some(match date_span {
                None => (rec.date, rec.date),
                Some((lo, hi)) => (lo.min(rec.date), hi.max(rec.date)),
            });
        }

        if coordinate_conflicts > 0 {
            log::warn!(
                "{coordinate_conflicts} rows disagree with their station's first coordinates; \
                 keeping the first pair per station"
            );
        }

        DelayTable {
            records,
            stations,
            train_categories,
            delay_categories,
            date_span,
            coordinate_conflicts,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The representative coordinates of a station.
    pub fn coordinates(&self, stop_name: &str) -> Option<Coordinates> {
        self.stations.get(stop_name).copied()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// All train categories present, sorted.
    pub fn train_categories(&self) -> &BTreeSet<String> {
        &self.train_categories
    }

    /// All delay categories present, sorted.
    pub fn delay_categories(&self) -> &BTreeSet<String> {
        &self.delay_categories
    }

    /// First and last observed date.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_span
    }

    /// Number of rows whose coordinates differ from their station's representative pair.
    pub fn coordinate_conflicts(&self) -> usize {
        self.coordinate_conflicts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use arrow::temporal_conversions::date32_to_datetime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use serde_json::Value as JsonValue;

use super::error::DashboardError;
use super::model::{CellValue, DelayTable, Record};
use super::schema::{resolve_columns, Column, ColumnIndex};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the delay dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – the dataset as exported by Pandas (recommended)
/// * `.csv`     – header row followed by one record per line
/// * `.json`    – `[{ "stop_name": "Bern", "hour": 8, ... }, ...]`
pub fn load_file(path: &Path) -> Result<DelayTable, DashboardError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        other => {
            return Err(DashboardError::unavailable(
                path,
                format!("unsupported file extension '.{other}'"),
            ))
        }
    };

    let table = DelayTable::from_records(records);
    match table.date_span() {
        Some((first, last)) => log::info!(
            "Loaded {} runs at {} stations ({first} to {last}) from {}",
            table.len(),
            table.station_count(),
            path.display()
        ),
        None => log::info!("Loaded an empty dataset from {}", path.display()),
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Read the ten schema columns from a Parquet file.
///
/// Works with the column types Pandas and Polars write for this data:
/// dictionary-encoded categoricals, any integer width, `Float32`/`Float64`,
/// `Date32`/`Date64`/timestamps, and booleans. Other columns in the file are
/// never decoded.
fn load_parquet(path: &Path) -> Result<Vec<Record>, DashboardError> {
    let file = std::fs::File::open(path).map_err(|e| DashboardError::unavailable(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DashboardError::unavailable(path, format!("reading parquet metadata: {e}")))?;

    let field_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let index = resolve_columns(&field_names)?;

    let mask = ProjectionMask::roots(builder.parquet_schema(), index.sorted_positions());
    let reader = builder
        .with_projection(mask)
        .build()
        .map_err(|e| DashboardError::unavailable(path, format!("building parquet reader: {e}")))?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| DashboardError::unavailable(path, format!("reading record batch: {e}")))?;
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        let batch_index = resolve_columns(&names)?;

        let mut columns = Vec::with_capacity(Column::ALL.len());
        for column in Column::ALL {
            columns.push(normalize(column, batch.column(batch_index.get(column)))?);
        }

        let offset = records.len();
        for row in 0..batch.num_rows() {
            let mut failure = None;
            let record = Record::from_cells(offset + row, |column| {
                match extract_cell(&columns[column as usize], row) {
                    Ok(cell) => cell,
                    Err(e) => {
                        failure.get_or_insert(e);
                        CellValue::Null
                    }
                }
            });
            if let Some(e) = failure {
                return Err(e);
            }
            records.push(record?);
        }
    }

    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Cast a column to one of the five physical types [`extract_cell`] reads:
/// `Utf8`, `Int64`, `Float64`, `Boolean` or `Date32`.
fn normalize(column: Column, array: &ArrayRef) -> Result<ArrayRef, DashboardError> {
    let target = match array.data_type() {
        DataType::Utf8 | DataType::Int64 | DataType::Float64 | DataType::Boolean | DataType::Date32 => {
            return Ok(array.clone())
        }
        DataType::Dictionary(_, value) => {
            let decoded = cast(array, value.as_ref()).map_err(|e| mismatch(column, e))?;
            return normalize(column, &decoded);
        }
        DataType::LargeUtf8 => DataType::Utf8,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 => DataType::Float64,
        DataType::Date64 | DataType::Timestamp(_, _) => DataType::Date32,
        other => {
            return Err(DashboardError::SchemaMismatch(format!(
                "column '{}' has unsupported type {other:?}",
                column.name()
            )))
        }
    };
    cast(array, &target).map_err(|e| mismatch(column, e))
}

fn mismatch(column: Column, err: impl std::fmt::Display) -> DashboardError {
    DashboardError::SchemaMismatch(format!("column '{}' cannot be read: {err}", column.name()))
}

/// Extract a single cell from a normalized Arrow column.
fn extract_cell(array: &ArrayRef, row: usize) -> Result<CellValue, DashboardError> {
    if array.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match array.data_type() {
        DataType::Utf8 => CellValue::Str(array.as_string::<i32>().value(row).to_string()),
        DataType::Int64 => CellValue::Int(array.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => CellValue::Float(array.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(array.as_boolean().value(row)),
        DataType::Date32 => {
            let days = array.as_primitive::<Date32Type>().value(row);
            match date32_to_datetime(days) {
                Some(dt) => CellValue::Date(dt.date()),
                None => CellValue::Null,
            }
        }
        other => {
            return Err(DashboardError::SchemaMismatch(format!(
                "unexpected column type {other:?} after normalization"
            )))
        }
    };
    Ok(cell)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names (canonical or German), one
/// record per line. Cell types are guessed; the schema coercion does the rest.
fn load_csv(path: &Path) -> Result<Vec<Record>, DashboardError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DashboardError::unavailable(path, e))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DashboardError::unavailable(path, format!("reading CSV headers: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let index: ColumnIndex = resolve_columns(&headers)?;

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result
            .map_err(|e| DashboardError::unavailable(path, format!("CSV row {row_no}: {e}")))?;
        let record = Record::from_cells(row_no, |column| {
            let raw = row.get(index.get(column)).unwrap_or("");
            match column {
                // Identifiers stay text even when they look numeric.
                Column::StopName | Column::LineId | Column::TrainCategory | Column::DelayCategory
                    if !raw.trim().is_empty() =>
                {
                    CellValue::Str(raw.trim().to_string())
                }
                _ => CellValue::guess(raw),
            }
        })?;
        records.push(record);
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "stop_name": "Bern", "latitude": 46.949, "longitude": 7.439,
///     "date": "2022-11-03", "hour": 8, "origin_class": "domestic",
///     "train_category": "IC", "line_id": "IC 1", "is_delayed": true,
///     "delay_category": "3-5 min"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Record>, DashboardError> {
    let text = std::fs::read_to_string(path).map_err(|e| DashboardError::unavailable(path, e))?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| DashboardError::unavailable(path, format!("parsing JSON: {e}")))?;

    let rows = root
        .as_array()
        .ok_or_else(|| DashboardError::unavailable(path, "expected a top-level JSON array"))?;

    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| DashboardError::unavailable(path, format!("row {i} is not a JSON object")))?;
        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        let index = resolve_columns(&keys)?;

        let record = Record::from_cells(i, |column| {
            obj.get(keys[index.get(column)])
                .map(json_to_cell)
                .unwrap_or(CellValue::Null)
        })?;
        records.push(record);
    }

    Ok(records)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Str(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Str(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Str(other.to_string()),
    }
}

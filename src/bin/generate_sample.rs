//! Writes a synthetic `data.parquet` with the delay dataset's schema, using
//! the German column names of the original SBB export.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{BooleanArray, Date32Array, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use rand::prelude::*;
use rand::rngs::StdRng;

/// (name, latitude, longitude, busyness)
const STATIONS: [(&str, f64, f64, u32); 12] = [
    ("Zürich HB", 47.3782, 8.5402, 6),
    ("Bern", 46.9490, 7.4391, 5),
    ("Basel SBB", 47.5476, 7.5896, 4),
    ("Genève", 46.2102, 6.1424, 4),
    ("Lausanne", 46.5167, 6.6291, 4),
    ("Luzern", 47.0502, 8.3102, 3),
    ("Olten", 47.3519, 7.9077, 3),
    ("Winterthur", 47.5003, 8.7237, 3),
    ("St. Gallen", 47.4232, 9.3701, 2),
    ("Lugano", 46.0055, 8.9469, 2),
    ("Chur", 46.8532, 9.5290, 1),
    ("Biel/Bienne", 47.1327, 7.2428, 2),
];

/// (category, share of international runs, base delay probability)
const CATEGORIES: [(&str, f64, f64); 7] = [
    ("S", 0.0, 0.08),
    ("R", 0.0, 0.06),
    ("RE", 0.02, 0.12),
    ("IR", 0.0, 0.15),
    ("IC", 0.05, 0.18),
    ("EC", 0.9, 0.35),
    ("ICE", 1.0, 0.45),
];

const DELAY_CATEGORIES: [&str; 3] = ["3-5 min", "5-15 min", "> 15 min"];

#[derive(Default)]
struct Columns {
    stop: Vec<&'static str>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    date: Vec<i32>,
    hour: Vec<i32>,
    origin: Vec<&'static str>,
    category: Vec<&'static str>,
    line: Vec<String>,
    delayed: Vec<bool>,
    delay_category: Vec<Option<&'static str>>,
}

/// Runs at every station for each hour from 05:00 to 23:00, 2022-11-03 to
/// 2022-12-31, twice as many in the rush hours.
fn generate(rng: &mut impl Rng) -> Result<Columns> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    let first = NaiveDate::from_ymd_opt(2022, 11, 3).context("first date")?;
    let last = NaiveDate::from_ymd_opt(2022, 12, 31).context("last date")?;

    let mut cols = Columns::default();

    for date in first.iter_days().take_while(|d| *d <= last) {
        let day = (date - epoch).num_days() as i32;
        for &(stop, lat, lon, busyness) in &STATIONS {
            for hour in 5..24 {
                let rush = matches!(hour, 6..=8 | 16..=18);
                let runs = busyness + if rush { busyness } else { 0 };
                for _ in 0..runs {
                    let &(category, international_share, delay_p) =
                        CATEGORIES.choose(rng).context("empty category table")?;
                    let international = rng.random_bool(international_share);
                    let delayed = rng.random_bool(delay_p * if rush { 1.5 } else { 1.0 });
                    let delay_category = if delayed {
                        DELAY_CATEGORIES.choose(rng).copied()
                    } else {
                        None
                    };

                    cols.stop.push(stop);
                    cols.lat.push(lat);
                    cols.lon.push(lon);
                    cols.date.push(day);
                    cols.hour.push(hour);
                    cols.origin.push(if international { "Ausland" } else { "Schweiz" });
                    cols.category.push(category);
                    cols.line.push(format!("{category} {}", rng.random_range(1..=40)));
                    cols.delayed.push(delayed);
                    cols.delay_category.push(delay_category);
                }
            }
        }
    }
    Ok(cols)
}

fn main() -> Result<()> {
    // Fixed seed so every run writes the same file.
    let mut rng = StdRng::seed_from_u64(42);
    let cols = generate(&mut rng)?;

    let n_rows = cols.stop.len();
    let schema = Arc::new(Schema::new(vec![
        Field::new("Haltestelle", DataType::Utf8, false),
        Field::new("lat", DataType::Float64, false),
        Field::new("long", DataType::Float64, false),
        Field::new("Datum", DataType::Date32, false),
        Field::new("Stunde", DataType::Int32, false),
        Field::new("Ursprung", DataType::Utf8, false),
        Field::new("Zuggattung", DataType::Utf8, false),
        Field::new("Linie", DataType::Utf8, false),
        Field::new("Ist verspätet", DataType::Boolean, false),
        Field::new("Verspätungskategorie", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(cols.stop)),
            Arc::new(Float64Array::from(cols.lat)),
            Arc::new(Float64Array::from(cols.lon)),
            Arc::new(Date32Array::from(cols.date)),
            Arc::new(Int32Array::from(cols.hour)),
            Arc::new(StringArray::from(cols.origin)),
            Arc::new(StringArray::from(cols.category)),
            Arc::new(StringArray::from(cols.line)),
            Arc::new(BooleanArray::from(cols.delayed)),
            Arc::new(StringArray::from(cols.delay_category)),
        ],
    )
    .context("building record batch")?;

    // Write Parquet
    let output_path = "data.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    println!("{}", pretty_format_batches(&[batch.slice(0, n_rows.min(5))])?);
    println!("Wrote {n_rows} runs at {} stations to {output_path}", STATIONS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_the_same_rows() {
        let a = generate(&mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate(&mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.category, b.category);
        assert_eq!(a.line, b.line);
        assert_eq!(a.delayed, b.delayed);
    }

    #[test]
    fn rows_follow_the_delay_schema() {
        let cols = generate(&mut StdRng::seed_from_u64(42)).unwrap();
        assert!(!cols.stop.is_empty());
        assert!(cols.hour.iter().all(|h| (5..24).contains(h)));
        for (delayed, category) in cols.delayed.iter().zip(&cols.delay_category) {
            assert_eq!(*delayed, category.is_some());
        }
        // ICE is always international, S never.
        for (category, origin) in cols.category.iter().zip(&cols.origin) {
            match *category {
                "ICE" => assert_eq!(*origin, "Ausland"),
                "S" => assert_eq!(*origin, "Schweiz"),
                _ => {}
            }
        }
        assert!(cols.delayed.iter().any(|d| *d));
    }
}

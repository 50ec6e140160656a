//! Bar loading from CSV.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Parsing is
//! fail-fast: a row with a missing or malformed field aborts the load
//! with its row number, so a broken bar can never reach the engine and
//! silently corrupt the equity curve.

use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;

use barforge_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {reason}")]
    Malformed { row: usize, reason: String },

    #[error("'{path}' contains no bars")]
    Empty { path: String },
}

/// Load a bar series from a CSV file, in file order.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 2; // 1-based, after the header
        bars.push(parse_row(&record, row)?);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            path: path.display().to_string(),
        });
    }
    Ok(bars)
}

fn parse_row(record: &csv::StringRecord, row: usize) -> Result<Bar, LoadError> {
    let field = |idx: usize, name: &str| -> Result<&str, LoadError> {
        record.get(idx).ok_or_else(|| LoadError::Malformed {
            row,
            reason: format!("missing '{name}' column"),
        })
    };
    let price = |idx: usize, name: &str| -> Result<Decimal, LoadError> {
        let raw = field(idx, name)?;
        Decimal::from_str(raw.trim()).map_err(|_| LoadError::Malformed {
            row,
            reason: format!("'{name}' is not a number: '{raw}'"),
        })
    };

    Ok(Bar {
        timestamp: parse_timestamp(field(0, "timestamp")?, row)?,
        open: price(1, "open")?,
        high: price(2, "high")?,
        low: price(3, "low")?,
        close: price(4, "close")?,
        volume: price(5, "volume")?,
    })
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, the `T`-separated variant, and bare
/// dates (midnight).
fn parse_timestamp(raw: &str, row: usize) -> Result<NaiveDateTime, LoadError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| {
                d.and_hms_opt(0, 0, 0)
                    .expect("midnight is always a valid time")
            })
        })
        .map_err(|_| LoadError::Malformed {
            row,
            reason: format!("unparseable timestamp '{raw}'"),
        })
}

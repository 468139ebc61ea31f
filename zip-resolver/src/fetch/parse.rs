//! Parsing of the semicolon-separated zip code directory.
//!
//! Column order is fixed:
//! `city;zipCode;extraDigit;commune;communeId;canton;east;north`.
//! The first record is a header and is discarded. Fields may be quoted,
//! in which case they can span lines or contain the delimiter.
//!
//! Malformed rows are skipped and reported as [`ParseWarning`]s rather than
//! aborting the whole dataset.

use std::fmt;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::warn;

use super::error::FetchError;
use crate::domain::{DatasetIndex, ZipCode, ZipRecord};

/// Number of columns in every data row.
pub const COLUMN_COUNT: usize = 8;

const DELIMITER: u8 = b';';

/// A row that was skipped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number in the CSV, header included.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// A freshly parsed dataset together with the rows that were skipped.
#[derive(Debug, Clone)]
pub struct FetchedDataset {
    pub index: DatasetIndex,
    pub warnings: Vec<ParseWarning>,
}

/// Parse CSV text into an index stamped with `fetched_at`.
///
/// Fails only if no row at all could be parsed.
pub fn parse_dataset(
    text: &str,
    fetched_at: DateTime<Utc>,
) -> Result<FetchedDataset, FetchError> {
    let (records, warnings) = parse_records(text);

    for warning in &warnings {
        warn!(line = warning.line, message = %warning.message, "skipping malformed row");
    }

    if records.is_empty() {
        return Err(FetchError::EmptyDataset {
            skipped: warnings.len(),
        });
    }

    Ok(FetchedDataset {
        index: DatasetIndex::from_records(records, fetched_at),
        warnings,
    })
}

/// Column names, for row warnings.
const COLUMNS: [&str; COLUMN_COUNT] = [
    "city",
    "zip code",
    "extra digit",
    "commune",
    "commune id",
    "canton",
    "east coordinate",
    "north coordinate",
];

/// One data row, deserialized by position.
#[derive(Debug, Deserialize)]
struct CsvRow {
    city: String,
    zip_code: ZipCode,
    extra_digit: u8,
    commune: String,
    commune_id: u32,
    canton: String,
    east: f64,
    north: f64,
}

/// Parse all data rows, in source order.
pub fn parse_records(text: &str) -> (Vec<ZipRecord>, Vec<ParseWarning>) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warnings.push(ParseWarning {
                    line: e.position().map_or(0, |p| p.line() as usize),
                    message: e.to_string(),
                });
                continue;
            }
        };

        let line = row.position().map_or(0, |p| p.line() as usize);
        match parse_row(&row) {
            Ok(record) => records.push(record),
            Err(message) => warnings.push(ParseWarning { line, message }),
        }
    }

    (records, warnings)
}

/// Map one row's fields onto a record.
fn parse_row(row: &StringRecord) -> Result<ZipRecord, String> {
    if row.len() != COLUMN_COUNT {
        return Err(format!(
            "expected {} fields, found {}",
            COLUMN_COUNT,
            row.len()
        ));
    }

    let raw: CsvRow = row.deserialize(None).map_err(|e| deserialize_message(&e))?;

    Ok(ZipRecord {
        zip_code: raw.zip_code,
        city: required_text(raw.city, "city")?,
        extra_digit: raw.extra_digit,
        commune: required_text(raw.commune, "commune")?,
        commune_id: raw.commune_id,
        canton: parse_canton(raw.canton)?,
        east: finite(raw.east, "east coordinate")?,
        north: finite(raw.north, "north coordinate")?,
    })
}

fn deserialize_message(e: &csv::Error) -> String {
    match e.kind() {
        csv::ErrorKind::Deserialize { err, .. } => {
            let column = err
                .field()
                .and_then(|idx| COLUMNS.get(idx as usize))
                .copied()
                .unwrap_or("row");
            format!("{column}: {}", err.kind())
        }
        _ => e.to_string(),
    }
}

fn required_text(value: String, name: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err(format!("{name} is empty"));
    }
    Ok(value)
}

fn finite(value: f64, name: &str) -> Result<f64, String> {
    if !value.is_finite() {
        return Err(format!("{name} {value} is not a finite number"));
    }
    Ok(value)
}

fn parse_canton(canton: String) -> Result<String, String> {
    if canton.len() != 2 || !canton.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(format!("canton {canton:?} is not a two-letter code"));
    }
    Ok(canton)
}

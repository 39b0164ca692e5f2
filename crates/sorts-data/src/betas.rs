//! Rolling disaster-risk beta panel.
//!
//! The upstream estimation writes one row per security-month with a
//! `permno` identifier, a `date_eom` month-end date and any number of
//! `beta_*` columns. Loading renames `date_eom` to `date` and keeps only
//! formation months on or after the sample cutoff.

use crate::dates::{parse_date, to_epoch_days};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Security identifier column.
pub const PERMNO_COLUMN: &str = "permno";

/// Date column after loading.
pub const DATE_COLUMN: &str = "date";

/// Date column as written by the beta estimation.
pub const SOURCE_DATE_COLUMN: &str = "date_eom";

/// Columns never treated as sort variables.
pub const RESERVED_COLUMNS: [&str; 3] = ["beta_PC1_balanced", PERMNO_COLUMN, DATE_COLUMN];

/// Cells read as missing values.
const MISSING_TOKENS: &[&str] = &["", "NA", "NaN", "nan", "null", "NULL"];

/// First formation month kept in the panel.
pub fn default_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(1997, 7, 31).unwrap_or(NaiveDate::MIN)
}

/// Filtered beta panel.
#[derive(Debug, Clone)]
pub struct BetaPanel {
    frame: DataFrame,
    columns: Vec<String>,
}

impl BetaPanel {
    /// Load the panel from a CSV file, dropping rows dated before `cutoff`.
    pub fn from_csv<P: AsRef<Path>>(path: P, cutoff: NaiveDate) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, cutoff)
    }

    /// Load the panel from any CSV source, dropping rows dated before `cutoff`.
    pub fn from_reader<R: Read>(reader: R, cutoff: NaiveDate) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| {
                if h == SOURCE_DATE_COLUMN {
                    DATE_COLUMN.to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        let permno_idx = column_index(&columns, PERMNO_COLUMN)?;
        let date_idx = column_index(&columns, DATE_COLUMN)
            .map_err(|_| DataError::MissingColumn(SOURCE_DATE_COLUMN.to_string()))?;

        let mut permnos = Vec::new();
        let mut dates = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); columns.len()];

        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            // Header is line 1.
            let line = line + 2;

            let raw_date = record.get(date_idx).unwrap_or_default();
            let date = parse_date(raw_date).ok_or_else(|| {
                DataError::Parse(format!("line {}: invalid {} '{}'", line, SOURCE_DATE_COLUMN, raw_date))
            })?;
            if date < cutoff {
                continue;
            }

            let raw_permno = record.get(permno_idx).unwrap_or_default();
            permnos.push(parse_permno(raw_permno).ok_or_else(|| {
                DataError::Parse(format!("line {}: invalid {} '{}'", line, PERMNO_COLUMN, raw_permno))
            })?);
            dates.push(to_epoch_days(date));

            for (idx, column) in columns.iter().enumerate() {
                if idx == permno_idx || idx == date_idx {
                    continue;
                }
                let raw = record.get(idx).unwrap_or_default();
                let value = parse_value(raw).ok_or_else(|| {
                    DataError::Parse(format!("line {}: invalid {} '{}'", line, column, raw))
                })?;
                values[idx].push(value);
            }
        }

        let mut frame_columns: Vec<Column> = Vec::with_capacity(columns.len());
        for (idx, (name, column_values)) in columns.iter().zip(values).enumerate() {
            let series = if idx == permno_idx {
                Series::new(name.as_str().into(), std::mem::take(&mut permnos))
            } else if idx == date_idx {
                Series::new(name.as_str().into(), std::mem::take(&mut dates)).cast(&DataType::Date)?
            } else {
                Series::new(name.as_str().into(), column_values)
            };
            frame_columns.push(series.into());
        }

        let frame = DataFrame::new(frame_columns)?;
        Ok(Self { frame, columns })
    }

    /// The underlying frame: `permno` (Int64), `date` (Date) and one Float64 column per beta.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// All column names in file order, with `date_eom` already renamed.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of security-months kept after the cutoff.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Sort variables: every column except [`RESERVED_COLUMNS`], in file order.
    pub fn variable_list(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !RESERVED_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    /// Earliest and latest formation month in the panel.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let days = self.frame.column(DATE_COLUMN)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let bounds = days
            .min()
            .zip(days.max())
            .and_then(|(lo, hi)| {
                crate::dates::from_epoch_days(lo).zip(crate::dates::from_epoch_days(hi))
            });
        Ok(bounds)
    }
}

fn column_index(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

fn parse_permno(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// `None` on malformed input, `Some(None)` for a missing value.
fn parse_value(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if MISSING_TOKENS.contains(&raw) {
        return Some(None);
    }
    raw.parse::<f64>().ok().map(|v| (!v.is_nan()).then_some(v))
}

//! Export functionality for combined sort tables.
//!
//! Each combined table is written to `port_sort_agg_<metric>.<ext>` in the
//! output directory. Existing files are overwritten.

use crate::combined::{CombinedTable, CombinedTables};
use crate::labels::DaysLabel;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name prefix shared by the three output tables.
pub const FILE_PREFIX: &str = "port_sort_agg";

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Row of a combined table in JSON form.
#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    date: NaiveDate,
    variable: &'a str,
    days: &'a DaysLabel,
    ew_count: u64,
    ew: &'a [Option<f64>],
    vw_count: u64,
    vw: &'a [Option<f64>],
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CombinedTable {
    /// Flat CSV records, header excluded.
    fn to_records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                let mut record = vec![
                    r.row.date.format("%Y-%m-%d").to_string(),
                    r.variable.clone(),
                    r.days.to_string(),
                ];
                for stats in [&r.row.ew, &r.row.vw] {
                    record.push(stats.count.to_string());
                    record.extend(
                        (0..self.ncuts).map(|b| format_value(stats.values.get(b).copied().flatten())),
                    );
                }
                record
            })
            .collect()
    }

    fn to_json_records(&self) -> Vec<JsonRecord<'_>> {
        self.rows
            .iter()
            .map(|r| JsonRecord {
                date: r.row.date,
                variable: &r.variable,
                days: &r.days,
                ew_count: r.row.ew.count,
                ew: &r.row.ew.values,
                vw_count: r.row.vw.count,
                vw: &r.row.vw.values,
            })
            .collect()
    }

    /// Output file name, e.g. `port_sort_agg_ret.csv`.
    pub fn file_name(&self, format: ExportFormat) -> String {
        format!("{}_{}.{}", FILE_PREFIX, self.metric.tag(), format.extension())
    }
}

impl Exporter for CombinedTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(self.columns())?;
                for record in self.to_records() {
                    wtr.write_record(&record)?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
            }
            ExportFormat::Json => Ok(serde_json::to_string(&self.to_json_records())?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(&self.to_json_records())?),
        }
    }
}

/// Write the three tables (ret, bm, op in that order) into `dir`.
///
/// The directory is created if needed. A failure leaves already written
/// tables in place. Returns the written paths.
pub fn write_tables(
    tables: &CombinedTables,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for table in tables.iter() {
        let path = dir.join(table.file_name(format));
        table.export_to_file(&path, format)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combined::CombinedRow;
    use sorts_portfolio::{BucketStats, SortMetric, SortRow};

    fn sample_table() -> CombinedTable {
        let mut table = CombinedTable::new(SortMetric::Ret, 2);
        table.rows.push(CombinedRow {
            variable: "rn_prob_20".to_string(),
            days: DaysLabel::Horizon(60),
            row: SortRow {
                date: NaiveDate::from_ymd_opt(1997, 7, 31).unwrap(),
                ew: BucketStats::new(4, vec![Some(0.01), Some(-0.5)]),
                vw: BucketStats::new(3, vec![None, Some(0.25)]),
            },
        });
        table
    }

    #[test]
    fn test_csv_header_and_row() {
        let csv = sample_table().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,variable,days,ew_count,ew_1,ew_2,vw_count,vw_1,vw_2"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1997-07-31,rn_prob_20,60,4,0.01,-0.5,3,,0.25"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let table = CombinedTable::new(SortMetric::Op, 5);
        let csv = table.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_json_export() {
        let json = sample_table().export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"variable\":\"rn_prob_20\""));
        assert!(json.contains("\"days\":60"));
        assert!(json.contains("\"vw\":[null,0.25]"));

        let pretty = sample_table()
            .export_to_string(ExportFormat::PrettyJson)
            .unwrap();
        assert!(pretty.contains("  "));
    }

    #[test]
    fn test_raw_days_exported_as_text() {
        let mut table = sample_table();
        table.rows[0].days = DaysLabel::Raw("beta_new".to_string());
        let json = table.export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"days\":\"beta_new\""));
    }

    #[test]
    fn test_file_names() {
        let table = sample_table();
        assert_eq!(table.file_name(ExportFormat::Csv), "port_sort_agg_ret.csv");
        assert_eq!(table.file_name(ExportFormat::Json), "port_sort_agg_ret.json");
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_write_tables_overwrites() {
        let dir = std::env::temp_dir().join("disaster_sorts_export_test");
        std::fs::remove_dir_all(&dir).ok();

        let tables = CombinedTables::new(2);
        let paths = write_tables(&tables, &dir, ExportFormat::Csv).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("port_sort_agg_ret.csv"));
        assert!(paths[1].ends_with("port_sort_agg_bm.csv"));
        assert!(paths[2].ends_with("port_sort_agg_op.csv"));

        std::fs::write(&paths[0], "stale").unwrap();
        write_tables(&tables, &dir, ExportFormat::Csv).unwrap();
        let content = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(content.starts_with("date,variable,days"));

        std::fs::remove_dir_all(dir).ok();
    }
}

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disaster-sorts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod combined;
pub mod export;
pub mod labels;

pub use combined::{AssembleError, CombinedRow, CombinedTable, CombinedTables, assemble};
pub use export::{ExportError, ExportFormat, Exporter, write_tables};
pub use labels::{DaysLabel, LABELS, LEVEL_FACTOR_DAYS, VariableLabel};

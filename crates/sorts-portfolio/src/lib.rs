#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disaster-sorts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod metric;
pub mod sorter;
pub mod table;

pub use error::{Result, SortError};
pub use metric::{SortMetric, Weighting, stat_columns};
pub use sorter::{DEFAULT_NCUTS, PortfolioSorter, monthly_portfolio_sorts};
pub use table::{BucketStats, PortfolioSorts, SortRow, SortTable};

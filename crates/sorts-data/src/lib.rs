#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/disaster-sorts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod betas;
pub mod dates;
pub mod db;
pub mod error;

pub use betas::{BetaPanel, RESERVED_COLUMNS, default_cutoff};
pub use db::{CharacteristicRecord, DbStats, MonthlyRecord, ResearchDb};
pub use error::{DataError, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

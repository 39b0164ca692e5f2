//! Error types for portfolio sorts.

use thiserror::Error;

/// Result type for sort operations.
pub type Result<T> = std::result::Result<T, SortError>;

/// Errors that can occur while forming portfolio sorts.
#[derive(Debug, Error)]
pub enum SortError {
    /// Error from the data layer
    #[error("Data error: {0}")]
    Data(#[from] sorts_data::DataError),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Sort variable not present in the beta panel
    #[error("Sort variable not found in beta panel: {0}")]
    MissingVariable(String),

    /// Fewer than two buckets requested
    #[error("Invalid bucket count {0}: need at least 2")]
    InvalidBucketCount(usize),

    /// Unexpected shape or value in an aggregated frame
    #[error("Computation error: {0}")]
    Computation(String),
}

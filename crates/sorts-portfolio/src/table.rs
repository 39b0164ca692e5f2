//! Sort tables produced for a single variable.

use crate::metric::{SortMetric, Weighting, stat_columns};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Count and per-bucket statistic for one weighting scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    /// Number of securities contributing to the statistic
    pub count: u64,
    /// Statistic per bucket, lowest bucket first; `None` for an empty bucket
    pub values: Vec<Option<f64>>,
}

impl BucketStats {
    /// Create bucket statistics.
    pub const fn new(count: u64, values: Vec<Option<f64>>) -> Self {
        Self { count, values }
    }

    /// Statistic of the highest bucket minus the lowest, when both exist.
    pub fn high_minus_low(&self) -> Option<f64> {
        match (self.values.first(), self.values.last()) {
            (Some(Some(low)), Some(Some(high))) if self.values.len() > 1 => Some(high - low),
            _ => None,
        }
    }
}

/// One formation month of a sort table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortRow {
    /// Formation month
    pub date: NaiveDate,
    /// Equal-weighted statistics
    pub ew: BucketStats,
    /// Value-weighted statistics
    pub vw: BucketStats,
}

impl SortRow {
    /// Statistics for the given weighting scheme.
    pub const fn stats(&self, weighting: Weighting) -> &BucketStats {
        match weighting {
            Weighting::Equal => &self.ew,
            Weighting::Value => &self.vw,
        }
    }
}

/// Time series of bucket statistics for one variable and one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortTable {
    /// Metric the table describes
    pub metric: SortMetric,
    /// Number of buckets
    pub ncuts: usize,
    /// Rows ordered by formation month
    pub rows: Vec<SortRow>,
}

impl SortTable {
    /// Create a table.
    pub const fn new(metric: SortMetric, ncuts: usize, rows: Vec<SortRow>) -> Self {
        Self {
            metric,
            ncuts,
            rows,
        }
    }

    /// Number of formation months.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Statistic column names, `ew_count` through `vw_<ncuts>`.
    pub fn columns(&self) -> Vec<String> {
        stat_columns(self.ncuts)
    }

    /// Time-series average of each bucket statistic, ignoring missing months.
    pub fn bucket_means(&self, weighting: Weighting) -> Vec<Option<f64>> {
        (0..self.ncuts)
            .map(|bucket| {
                let values: Vec<f64> = self
                    .rows
                    .iter()
                    .filter_map(|row| row.stats(weighting).values.get(bucket).copied().flatten())
                    .collect();
                if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                }
            })
            .collect()
    }
}

/// The three sort tables of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSorts {
    /// Return table
    pub ret: SortTable,
    /// Book-to-market table
    pub bm: SortTable,
    /// Operating profitability table
    pub op: SortTable,
}

impl PortfolioSorts {
    /// Table for the given metric.
    pub const fn table(&self, metric: SortMetric) -> &SortTable {
        match metric {
            SortMetric::Ret => &self.ret,
            SortMetric::Bm => &self.bm,
            SortMetric::Op => &self.op,
        }
    }
}

//! Sort metrics and weighting schemes
//!
//! Every variable produces one table per [`SortMetric`]. The three tables
//! share a column layout, so downstream code iterates over
//! [`SortMetric::ALL`] instead of handling each table by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bucket statistic reported in a sort table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SortMetric {
    /// Return over the month following formation
    Ret,
    /// Book-to-market at formation
    Bm,
    /// Operating profitability at formation
    Op,
}

impl SortMetric {
    /// All metrics in output order.
    pub const ALL: [Self; 3] = [Self::Ret, Self::Bm, Self::Op];

    /// Short tag used in table keys and file names.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Ret => "ret",
            Self::Bm => "bm",
            Self::Op => "op",
        }
    }

    /// Column of the characteristic panel the metric is computed from.
    pub const fn source_column(&self) -> &'static str {
        match self {
            Self::Ret => "ret_lead",
            Self::Bm => "bm",
            Self::Op => "op",
        }
    }

    /// Brief description of what the metric measures
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Ret => "Portfolio return over the month after formation",
            Self::Bm => "Book-to-market ratio at formation",
            Self::Op => "Operating profitability at formation",
        }
    }

    /// Look up a metric by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.tag() == tag)
    }
}

impl fmt::Display for SortMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Weighting scheme within a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weighting {
    /// Simple average
    Equal,
    /// Average weighted by market equity
    Value,
}

impl Weighting {
    /// Both schemes in output order.
    pub const ALL: [Self; 2] = [Self::Equal, Self::Value];

    /// Column prefix (`ew` / `vw`).
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Equal => "ew",
            Self::Value => "vw",
        }
    }

    /// Name of the count column for this scheme.
    pub fn count_column(&self) -> String {
        format!("{}_count", self.prefix())
    }

    /// Name of the statistic column for 1-based `bucket`.
    pub fn bucket_column(&self, bucket: usize) -> String {
        format!("{}_{}", self.prefix(), bucket)
    }
}

/// Statistic columns of a sort table, in output order:
/// `ew_count, ew_1..ew_n, vw_count, vw_1..vw_n`.
pub fn stat_columns(ncuts: usize) -> Vec<String> {
    Weighting::ALL
        .iter()
        .flat_map(|w| {
            std::iter::once(w.count_column()).chain((1..=ncuts).map(move |b| w.bucket_column(b)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_tags() {
        let tags: Vec<_> = SortMetric::ALL.iter().map(|m| m.tag()).collect();
        assert_eq!(tags, vec!["ret", "bm", "op"]);
        assert_eq!(SortMetric::from_tag("bm"), Some(SortMetric::Bm));
        assert_eq!(SortMetric::from_tag("size"), None);
    }

    #[test]
    fn test_ret_uses_lead_return() {
        assert_eq!(SortMetric::Ret.source_column(), "ret_lead");
        assert_eq!(SortMetric::Op.source_column(), "op");
    }

    #[test]
    fn test_stat_columns_layout() {
        let cols = stat_columns(5);
        assert_eq!(cols.len(), 12);
        assert_eq!(cols[0], "ew_count");
        assert_eq!(cols[1], "ew_1");
        assert_eq!(cols[5], "ew_5");
        assert_eq!(cols[6], "vw_count");
        assert_eq!(cols[11], "vw_5");
    }
}

//! Monthly portfolio sorts.
//!
//! Securities are ranked on the sort variable within each formation month
//! and split into `ncuts` equal-count buckets. Bucket statistics for every
//! [`SortMetric`] are then aggregated per month, equal- and value-weighted.

use crate::error::{Result, SortError};
use crate::metric::{SortMetric, Weighting};
use crate::table::{BucketStats, PortfolioSorts, SortRow, SortTable};
use chrono::NaiveDate;
use polars::prelude::*;
use sorts_data::betas::{DATE_COLUMN, PERMNO_COLUMN};
use sorts_data::dates::from_epoch_days;
use sorts_data::{BetaPanel, ResearchDb, default_cutoff};
use std::collections::HashMap;

/// Default number of buckets.
pub const DEFAULT_NCUTS: usize = 5;

const SORT_VALUE: &str = "_sort_value";
const RANK: &str = "_rank";
const GROUP_SIZE: &str = "_n";
const BUCKET: &str = "_bucket";
const MARKET_EQUITY: &str = "me";

/// Forms portfolio sorts against a fixed characteristic panel.
#[derive(Debug, Clone)]
pub struct PortfolioSorter {
    characteristics: DataFrame,
    ncuts: usize,
}

impl PortfolioSorter {
    /// Load characteristics for every formation month on or after `start`.
    pub fn new(db: &ResearchDb, start: NaiveDate, ncuts: usize) -> Result<Self> {
        let characteristics = db.characteristic_panel(start)?;
        Self::from_characteristics(characteristics, ncuts)
    }

    /// Use an already loaded characteristic panel.
    ///
    /// The frame needs `permno`, `date`, `me`, `bm`, `op` and `ret_lead`.
    pub fn from_characteristics(characteristics: DataFrame, ncuts: usize) -> Result<Self> {
        if ncuts < 2 {
            return Err(SortError::InvalidBucketCount(ncuts));
        }
        Ok(Self {
            characteristics,
            ncuts,
        })
    }

    /// Number of buckets.
    pub const fn ncuts(&self) -> usize {
        self.ncuts
    }

    /// Sort the panel on `variable` and describe every bucket.
    pub fn sort(&self, panel: &BetaPanel, variable: &str) -> Result<PortfolioSorts> {
        if !panel.columns().iter().any(|c| c == variable) {
            return Err(SortError::MissingVariable(variable.to_string()));
        }

        let ranked = self.assign_buckets(panel, variable)?;

        let ret = self.summarize(&ranked, SortMetric::Ret)?;
        let bm = self.summarize(&ranked, SortMetric::Bm)?;
        let op = self.summarize(&ranked, SortMetric::Op)?;

        Ok(PortfolioSorts { ret, bm, op })
    }

    /// Attach each security-month to its bucket.
    ///
    /// Returns a DataFrame with the characteristic columns plus `_bucket`
    /// (1 = lowest values of `variable`).
    fn assign_buckets(&self, panel: &BetaPanel, variable: &str) -> Result<DataFrame> {
        let ncuts = self.ncuts as f64;

        let ranked = panel
            .frame()
            .clone()
            .lazy()
            .select([
                col(PERMNO_COLUMN),
                col(DATE_COLUMN),
                col(variable).cast(DataType::Float64).alias(SORT_VALUE),
            ])
            .filter(col(SORT_VALUE).is_not_null())
            .join(
                self.characteristics.clone().lazy(),
                [col(PERMNO_COLUMN), col(DATE_COLUMN)],
                [col(PERMNO_COLUMN), col(DATE_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            )
            // Ordinal ranks break ties in permno order.
            .sort([DATE_COLUMN, PERMNO_COLUMN], SortMultipleOptions::default())
            .with_columns([
                col(SORT_VALUE)
                    .rank(
                        RankOptions {
                            method: RankMethod::Ordinal,
                            descending: false,
                        },
                        None,
                    )
                    .over([col(DATE_COLUMN)])
                    .cast(DataType::Float64)
                    .alias(RANK),
                col(SORT_VALUE)
                    .count()
                    .over([col(DATE_COLUMN)])
                    .cast(DataType::Float64)
                    .alias(GROUP_SIZE),
            ])
            .with_column(
                (((col(RANK) - lit(1.0)) * lit(ncuts) / col(GROUP_SIZE))
                    .floor()
                    .cast(DataType::Int32)
                    + lit(1))
                .alias(BUCKET),
            )
            .collect()?;

        Ok(ranked)
    }

    /// Aggregate one metric into a sort table.
    fn summarize(&self, ranked: &DataFrame, metric: SortMetric) -> Result<SortTable> {
        let value = col(metric.source_column());
        let vw_mask = value
            .clone()
            .is_not_null()
            .and(col(MARKET_EQUITY).is_not_null())
            .and(col(MARKET_EQUITY).gt(lit(0.0)));

        let mut aggs = vec![
            value.clone().count().alias(Weighting::Equal.count_column()),
            value
                .clone()
                .filter(vw_mask.clone())
                .count()
                .alias(Weighting::Value.count_column()),
        ];

        for bucket in 1..=self.ncuts {
            let in_bucket = col(BUCKET).eq(lit(bucket as i32));
            let vw_in_bucket = vw_mask.clone().and(in_bucket.clone());

            aggs.push(
                value
                    .clone()
                    .filter(in_bucket)
                    .mean()
                    .alias(Weighting::Equal.bucket_column(bucket)),
            );
            aggs.push(
                ((value.clone() * col(MARKET_EQUITY))
                    .filter(vw_in_bucket.clone())
                    .sum()
                    / col(MARKET_EQUITY).filter(vw_in_bucket).sum())
                .alias(Weighting::Value.bucket_column(bucket)),
            );
        }

        let summary = ranked
            .clone()
            .lazy()
            .group_by([col(DATE_COLUMN)])
            .agg(aggs)
            .sort([DATE_COLUMN], SortMultipleOptions::default())
            .collect()?;

        let rows = self.to_rows(&summary)?;
        Ok(SortTable::new(metric, self.ncuts, rows))
    }

    /// Convert an aggregated frame into typed rows.
    fn to_rows(&self, summary: &DataFrame) -> Result<Vec<SortRow>> {
        let dates = summary.column(DATE_COLUMN)?.cast(&DataType::Int32)?;
        let dates = dates.i32()?;

        let mut stats: HashMap<Weighting, (Vec<u64>, Vec<Vec<Option<f64>>>)> = HashMap::new();
        for weighting in Weighting::ALL {
            let counts = count_column(summary, &weighting.count_column())?;
            let buckets = (1..=self.ncuts)
                .map(|b| float_column(summary, &weighting.bucket_column(b)))
                .collect::<Result<Vec<_>>>()?;
            stats.insert(weighting, (counts, buckets));
        }

        let mut rows = Vec::with_capacity(summary.height());
        for i in 0..summary.height() {
            let days = dates
                .get(i)
                .ok_or_else(|| SortError::Computation("Missing formation date".to_string()))?;
            let date = from_epoch_days(days)
                .ok_or_else(|| SortError::Computation(format!("Date out of range: {}", days)))?;

            let bucket_stats = |weighting: Weighting| {
                let (counts, buckets) = &stats[&weighting];
                BucketStats::new(counts[i], buckets.iter().map(|b| b[i]).collect())
            };

            rows.push(SortRow {
                date,
                ew: bucket_stats(Weighting::Equal),
                vw: bucket_stats(Weighting::Value),
            });
        }

        Ok(rows)
    }
}

fn count_column(df: &DataFrame, name: &str) -> Result<Vec<u64>> {
    let counts = df.column(name)?.cast(&DataType::Int64)?;
    let counts = counts.i64()?;
    Ok(counts
        .into_iter()
        .map(|c| c.unwrap_or(0).max(0) as u64)
        .collect())
}

/// Non-finite statistics (an empty value-weighted bucket divides 0 by 0) become missing.
fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = df.column(name)?.cast(&DataType::Float64)?;
    let values = values.f64()?;
    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Sort the panel on every variable in `variables`.
///
/// Characteristics are loaded once from `db`, starting at the panel's first
/// formation month.
pub fn monthly_portfolio_sorts(
    db: &ResearchDb,
    panel: &BetaPanel,
    variables: &[String],
    ncuts: usize,
) -> Result<HashMap<String, PortfolioSorts>> {
    let start = panel
        .date_range()?
        .map_or_else(default_cutoff, |(first, _)| first);
    let sorter = PortfolioSorter::new(db, start, ncuts)?;

    variables
        .iter()
        .map(|variable| Ok((variable.clone(), sorter.sort(panel, variable)?)))
        .collect()
}

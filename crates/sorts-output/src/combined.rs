//! Combined sort tables across variables.
//!
//! Per-variable tables are appended in variable-list order, one block per
//! variable, and tagged with the raw identifier. Relabeling then swaps the
//! identifier for its display name and horizon.

use crate::labels::{DaysLabel, days_label, display_name, lookup};
use sorts_portfolio::{PortfolioSorts, SortMetric, SortRow, SortTable, stat_columns};
use std::collections::HashMap;
use thiserror::Error;

/// Row-index column name.
pub const INDEX_COLUMN: &str = "date";

/// Errors that can occur while assembling combined tables.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// Variable listed for output but absent from the sort results
    #[error("No portfolio sorts for variable: {0}")]
    MissingSorts(String),

    /// Appended table does not share the combined column layout
    #[error("Bucket count mismatch for {variable}: table has {found}, expected {expected}")]
    LayoutMismatch {
        /// Variable being appended
        variable: String,
        /// Bucket count of the combined table
        expected: usize,
        /// Bucket count of the appended table
        found: usize,
    },
}

/// One row of a combined table.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    /// Variable name (raw identifier until relabeled)
    pub variable: String,
    /// Horizon label (raw identifier until relabeled)
    pub days: DaysLabel,
    /// Bucket statistics
    pub row: SortRow,
}

/// All variables' tables for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    /// Metric shared by every row
    pub metric: SortMetric,
    /// Number of buckets
    pub ncuts: usize,
    /// Rows in append order
    pub rows: Vec<CombinedRow>,
}

impl CombinedTable {
    /// Create an empty combined table.
    pub const fn new(metric: SortMetric, ncuts: usize) -> Self {
        Self {
            metric,
            ncuts,
            rows: Vec::new(),
        }
    }

    /// Append `table` as a block tagged with the raw `variable` identifier.
    pub fn append(&mut self, variable: &str, table: &SortTable) -> Result<(), AssembleError> {
        if table.ncuts != self.ncuts {
            return Err(AssembleError::LayoutMismatch {
                variable: variable.to_string(),
                expected: self.ncuts,
                found: table.ncuts,
            });
        }

        self.rows.extend(table.rows.iter().map(|row| CombinedRow {
            variable: variable.to_string(),
            days: DaysLabel::Raw(variable.to_string()),
            row: row.clone(),
        }));
        Ok(())
    }

    /// Replace raw identifiers with display names and horizons.
    ///
    /// Identifiers with no label are left as they are and returned, each once,
    /// in order of first appearance.
    pub fn relabel(&mut self) -> Vec<String> {
        let mut unmatched: Vec<String> = Vec::new();

        for row in &mut self.rows {
            if lookup(&row.variable).is_none() && !unmatched.contains(&row.variable) {
                unmatched.push(row.variable.clone());
            }
            if let DaysLabel::Raw(raw) = &row.days {
                row.days = days_label(raw);
            }
            row.variable = display_name(&row.variable).to_string();
        }

        unmatched
    }

    /// Output columns: `date, variable, days, ew_count, ew_1.., vw_count, vw_1..`.
    pub fn columns(&self) -> Vec<String> {
        [INDEX_COLUMN, "variable", "days"]
            .into_iter()
            .map(String::from)
            .chain(stat_columns(self.ncuts))
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The three combined tables, one per [`SortMetric`].
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTables {
    ret: CombinedTable,
    bm: CombinedTable,
    op: CombinedTable,
}

impl CombinedTables {
    /// Create empty tables.
    pub const fn new(ncuts: usize) -> Self {
        Self {
            ret: CombinedTable::new(SortMetric::Ret, ncuts),
            bm: CombinedTable::new(SortMetric::Bm, ncuts),
            op: CombinedTable::new(SortMetric::Op, ncuts),
        }
    }

    /// Table for the given metric.
    pub const fn table(&self, metric: SortMetric) -> &CombinedTable {
        match metric {
            SortMetric::Ret => &self.ret,
            SortMetric::Bm => &self.bm,
            SortMetric::Op => &self.op,
        }
    }

    const fn table_mut(&mut self, metric: SortMetric) -> &mut CombinedTable {
        match metric {
            SortMetric::Ret => &mut self.ret,
            SortMetric::Bm => &mut self.bm,
            SortMetric::Op => &mut self.op,
        }
    }

    /// Tables in output order (ret, bm, op).
    pub fn iter(&self) -> impl Iterator<Item = &CombinedTable> {
        SortMetric::ALL.into_iter().map(|m| self.table(m))
    }

    /// Append one variable's sorts to all three tables.
    pub fn append(&mut self, variable: &str, sorts: &PortfolioSorts) -> Result<(), AssembleError> {
        for metric in SortMetric::ALL {
            self.table_mut(metric).append(variable, sorts.table(metric))?;
        }
        Ok(())
    }

    /// Relabel all three tables; returns identifiers with no label.
    pub fn relabel(&mut self) -> Vec<String> {
        let mut unmatched = Vec::new();
        for metric in SortMetric::ALL {
            for raw in self.table_mut(metric).relabel() {
                if !unmatched.contains(&raw) {
                    unmatched.push(raw);
                }
            }
        }
        unmatched
    }
}

/// Build the combined tables from per-variable sorts, in `variables` order.
pub fn assemble(
    ports: &HashMap<String, PortfolioSorts>,
    variables: &[String],
    ncuts: usize,
) -> Result<CombinedTables, AssembleError> {
    let mut tables = CombinedTables::new(ncuts);
    for variable in variables {
        let sorts = ports
            .get(variable)
            .ok_or_else(|| AssembleError::MissingSorts(variable.clone()))?;
        tables.append(variable, sorts)?;
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sorts_portfolio::BucketStats;

    fn table(metric: SortMetric, months: u32, value: f64) -> SortTable {
        let rows = (1..=months)
            .map(|m| SortRow {
                date: NaiveDate::from_ymd_opt(2000, m, 1).unwrap(),
                ew: BucketStats::new(2, vec![Some(value), Some(value)]),
                vw: BucketStats::new(2, vec![Some(value), None]),
            })
            .collect();
        SortTable::new(metric, 2, rows)
    }

    fn sorts(months: u32, value: f64) -> PortfolioSorts {
        PortfolioSorts {
            ret: table(SortMetric::Ret, months, value),
            bm: table(SortMetric::Bm, months, value),
            op: table(SortMetric::Op, months, value),
        }
    }

    fn ports() -> HashMap<String, PortfolioSorts> {
        let mut ports = HashMap::new();
        ports.insert("beta_level".to_string(), sorts(2, 1.0));
        ports.insert("beta_ind_D_clamp_90_N".to_string(), sorts(3, 2.0));
        ports
    }

    #[test]
    fn test_one_block_per_variable_in_list_order() {
        let variables = vec!["beta_ind_D_clamp_90_N".to_string(), "beta_level".to_string()];
        let tables = assemble(&ports(), &variables, 2).unwrap();

        for table in tables.iter() {
            assert_eq!(table.len(), 5);
            let tags: Vec<_> = table.rows.iter().map(|r| r.variable.as_str()).collect();
            assert_eq!(
                tags,
                vec![
                    "beta_ind_D_clamp_90_N",
                    "beta_ind_D_clamp_90_N",
                    "beta_ind_D_clamp_90_N",
                    "beta_level",
                    "beta_level"
                ]
            );
            assert!(table
                .rows
                .iter()
                .all(|r| r.days == DaysLabel::Raw(r.variable.clone())));
        }
    }

    #[test]
    fn test_missing_sorts() {
        let variables = vec!["beta_absent".to_string()];
        let err = assemble(&ports(), &variables, 2).unwrap_err();
        assert!(matches!(err, AssembleError::MissingSorts(v) if v == "beta_absent"));
    }

    #[test]
    fn test_layout_mismatch() {
        let mut combined = CombinedTable::new(SortMetric::Ret, 5);
        let err = combined
            .append("beta_level", &table(SortMetric::Ret, 1, 0.0))
            .unwrap_err();
        assert!(matches!(
            err,
            AssembleError::LayoutMismatch {
                expected: 5,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_relabel_known_and_unknown() {
        let mut ports = ports();
        ports.insert("beta_mystery".to_string(), sorts(1, 3.0));
        let variables = vec![
            "beta_level".to_string(),
            "beta_mystery".to_string(),
            "beta_ind_D_clamp_90_N".to_string(),
        ];

        let mut tables = assemble(&ports, &variables, 2).unwrap();
        let unmatched = tables.relabel();
        assert_eq!(unmatched, vec!["beta_mystery".to_string()]);

        let ret = tables.table(SortMetric::Ret);
        assert_eq!(ret.rows[0].variable, "level_factor");
        assert_eq!(ret.rows[0].days, DaysLabel::Horizon(-99));
        assert_eq!(ret.rows[2].variable, "beta_mystery");
        assert_eq!(ret.rows[2].days, DaysLabel::Raw("beta_mystery".to_string()));
        assert_eq!(ret.rows[3].variable, "D_clamp");
        assert_eq!(ret.rows[3].days, DaysLabel::Horizon(90));
    }

    #[test]
    fn test_columns() {
        let table = CombinedTable::new(SortMetric::Bm, 5);
        let cols = table.columns();
        assert_eq!(&cols[..4], ["date", "variable", "days", "ew_count"]);
        assert_eq!(cols.len(), 15);
        assert_eq!(cols.last().unwrap(), "vw_5");
    }
}

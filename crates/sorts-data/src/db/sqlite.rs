//! SQLite research database.
//!
//! Holds the monthly security file (returns and market equity) and the
//! accounting characteristics used to describe each portfolio.

use crate::dates::{parse_date, to_epoch_days};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use rusqlite::{Connection, OpenFlags, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// SQLite handle to the research database.
#[derive(Debug)]
pub struct ResearchDb {
    conn: Connection,
}

/// One security-month from the monthly security file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// Security identifier
    pub permno: i64,
    /// Month-end date
    pub date: NaiveDate,
    /// Holding period return over the month
    pub ret: Option<f64>,
    /// Market equity at month end
    pub me: Option<f64>,
}

/// Accounting characteristics of a security at a month end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicRecord {
    /// Security identifier
    pub permno: i64,
    /// Month-end date
    pub date: NaiveDate,
    /// Book-to-market ratio
    pub bm: Option<f64>,
    /// Operating profitability
    pub op: Option<f64>,
}

impl ResearchDb {
    /// Open an existing research database.
    ///
    /// Unlike a cache, a missing file is an error: an empty database would
    /// silently produce empty sorts.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::DatabaseNotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create a new database file (or open it if present).
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS crsp_monthly (
                permno INTEGER NOT NULL,
                date TEXT NOT NULL,
                ret REAL,
                me REAL,
                PRIMARY KEY (permno, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_crsp_monthly_date ON crsp_monthly(date)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS characteristics (
                permno INTEGER NOT NULL,
                date TEXT NOT NULL,
                bm REAL,
                op REAL,
                PRIMARY KEY (permno, date)
            )",
            [],
        )?;

        Ok(())
    }

    /// Store monthly security records.
    pub fn put_monthly(&self, records: &[MonthlyRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        for record in records {
            tx.execute(
                "INSERT OR REPLACE INTO crsp_monthly (permno, date, ret, me)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.permno,
                    record.date.to_string(),
                    record.ret,
                    record.me
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Store accounting characteristics.
    pub fn put_characteristics(&self, records: &[CharacteristicRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        for record in records {
            tx.execute(
                "INSERT OR REPLACE INTO characteristics (permno, date, bm, op)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.permno,
                    record.date.to_string(),
                    record.bm,
                    record.op
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Security-month characteristics for every formation month on or after `start`.
    ///
    /// Returns a DataFrame with columns:
    /// [permno, date, me, bm, op, ret_lead]
    ///
    /// `ret_lead` is the return of the same security over the following
    /// calendar month, i.e. the return earned by a portfolio formed at `date`.
    pub fn characteristic_panel(&self, start: NaiveDate) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT m.permno, m.date, m.me, c.bm, c.op, n.ret
             FROM crsp_monthly m
             LEFT JOIN characteristics c
                ON c.permno = m.permno AND c.date = m.date
             LEFT JOIN crsp_monthly n
                ON n.permno = m.permno
               AND date(n.date, 'start of month', '-1 day') = m.date
             WHERE m.date >= ?1
             ORDER BY m.date ASC, m.permno ASC",
        )?;

        let mut permnos = Vec::new();
        let mut dates = Vec::new();
        let mut mes = Vec::new();
        let mut bms = Vec::new();
        let mut ops = Vec::new();
        let mut ret_leads = Vec::new();

        let rows = stmt.query_map(params![start.to_string()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<f64>>(5)?,
            ))
        })?;

        for row in rows {
            let (permno, date, me, bm, op, ret_lead) = row?;
            let date = parse_date(&date)
                .ok_or_else(|| DataError::Parse(format!("Invalid date in crsp_monthly: {}", date)))?;
            permnos.push(permno);
            dates.push(to_epoch_days(date));
            mes.push(me);
            bms.push(bm);
            ops.push(op);
            ret_leads.push(ret_lead);
        }

        let df = DataFrame::new(vec![
            Series::new("permno".into(), permnos).into(),
            Series::new("date".into(), dates)
                .cast(&DataType::Date)?
                .into(),
            Series::new("me".into(), mes).into(),
            Series::new("bm".into(), bms).into(),
            Series::new("op".into(), ops).into(),
            Series::new("ret_lead".into(), ret_leads).into(),
        ])?;

        Ok(df)
    }

    /// Get database statistics.
    pub fn get_stats(&self) -> Result<DbStats> {
        let monthly_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM crsp_monthly", [], |row| row.get(0))?;

        let permno_count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT permno) FROM crsp_monthly",
            [],
            |row| row.get(0),
        )?;

        let characteristics_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM characteristics", [], |row| {
                    row.get(0)
                })?;

        Ok(DbStats {
            monthly_records: monthly_count as usize,
            unique_permnos: permno_count as usize,
            characteristic_records: characteristics_count as usize,
        })
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbStats {
    /// Total number of monthly security records
    pub monthly_records: usize,
    /// Number of distinct securities
    pub unique_permnos: usize,
    /// Total number of characteristic records
    pub characteristic_records: usize,
}

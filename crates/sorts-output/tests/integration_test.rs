//! Integration tests for the load, sort, assemble, relabel and write pipeline.

use chrono::NaiveDate;
use sorts_data::{BetaPanel, MonthlyRecord, ResearchDb, default_cutoff};
use sorts_output::{ExportFormat, assemble, write_tables};
use sorts_portfolio::{DEFAULT_NCUTS, SortMetric, monthly_portfolio_sorts};
use std::path::Path;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const BETAS: &str = "\
permno,date_eom,beta_level,beta_PC1_balanced,beta_ind_rn_prob_20_60_N
1,1997-06-30,0.1,0.0,0.5
1,1997-07-31,0.1,0.0,0.5
2,1997-07-31,0.2,0.0,0.4
3,1997-07-31,0.3,0.0,0.3
4,1997-07-31,0.4,0.0,0.2
5,1997-07-31,0.5,0.0,0.1
";

fn research_db() -> ResearchDb {
    let db = ResearchDb::in_memory().unwrap();
    let mut records = Vec::new();
    for permno in 1..=5_i64 {
        for date in [ymd(1997, 6, 30), ymd(1997, 7, 31), ymd(1997, 8, 31)] {
            records.push(MonthlyRecord {
                permno,
                date,
                ret: Some(permno as f64 / 100.0),
                me: Some(100.0),
            });
        }
    }
    db.put_monthly(&records).unwrap();
    db
}

fn run_pipeline(dir: &Path) -> Vec<String> {
    let db = research_db();
    let panel = BetaPanel::from_reader(BETAS.as_bytes(), default_cutoff()).unwrap();
    let variables = panel.variable_list();
    let ports = monthly_portfolio_sorts(&db, &panel, &variables, DEFAULT_NCUTS).unwrap();

    let mut tables = assemble(&ports, &variables, DEFAULT_NCUTS).unwrap();
    let unmatched = tables.relabel();
    assert!(unmatched.is_empty());

    write_tables(&tables, dir, ExportFormat::Csv).unwrap();
    variables
}

fn read_records(path: &Path) -> Vec<csv::StringRecord> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.records().map(|r| r.unwrap()).collect()
}

#[test]
fn test_end_to_end_relabeled_returns() {
    let dir = std::env::temp_dir().join("disaster_sorts_e2e");
    std::fs::remove_dir_all(&dir).ok();

    let variables = run_pipeline(&dir);
    assert_eq!(
        variables,
        vec![
            "beta_level".to_string(),
            "beta_ind_rn_prob_20_60_N".to_string()
        ]
    );

    let records = read_records(&dir.join("port_sort_agg_ret.csv"));
    // One formation month per variable survives the cutoff.
    assert_eq!(records.len(), 2);

    assert_eq!(&records[0][0], "1997-07-31");
    assert_eq!(&records[0][1], "level_factor");
    assert_eq!(&records[0][2], "-99");
    assert_eq!(&records[0][3], "5");

    assert_eq!(&records[1][1], "rn_prob_20");
    assert_eq!(&records[1][2], "60");

    // Sorting on beta_level puts permno 1 in bucket 1; on the horizon beta it lands in bucket 5.
    assert_eq!(&records[0][4], "0.01");
    assert_eq!(&records[1][8], "0.01");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_all_three_tables_written() {
    let dir = std::env::temp_dir().join("disaster_sorts_e2e_tables");
    std::fs::remove_dir_all(&dir).ok();

    run_pipeline(&dir);
    for metric in SortMetric::ALL {
        let path = dir.join(format!("port_sort_agg_{}.csv", metric.tag()));
        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(&headers[0], "date");
        assert_eq!(&headers[1], "variable");
        assert_eq!(&headers[2], "days");
        assert_eq!(headers.len(), 3 + 2 * (DEFAULT_NCUTS + 1));
    }

    // No characteristics stored: bm counts are zero but rows still exist.
    let bm = read_records(&dir.join("port_sort_agg_bm.csv"));
    assert_eq!(bm.len(), 2);
    assert_eq!(&bm[0][3], "0");
    assert_eq!(&bm[0][4], "");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_rerun_is_byte_identical() {
    let first = std::env::temp_dir().join("disaster_sorts_idem_a");
    let second = std::env::temp_dir().join("disaster_sorts_idem_b");
    std::fs::remove_dir_all(&first).ok();
    std::fs::remove_dir_all(&second).ok();

    run_pipeline(&first);
    run_pipeline(&second);

    for metric in SortMetric::ALL {
        let name = format!("port_sort_agg_{}.csv", metric.tag());
        let a = std::fs::read(first.join(&name)).unwrap();
        let b = std::fs::read(second.join(&name)).unwrap();
        assert_eq!(a, b);
    }

    std::fs::remove_dir_all(first).ok();
    std::fs::remove_dir_all(second).ok();
}

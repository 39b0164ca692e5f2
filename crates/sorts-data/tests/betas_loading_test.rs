//! Integration tests for loading the beta panel from disk

use chrono::NaiveDate;
use sorts_data::{BetaPanel, DataError, default_cutoff};

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join("disaster_sorts_betas_loading.csv");
    std::fs::write(
        &path,
        "permno,date_eom,beta_PC1_balanced,beta_PC1_unbalanced,beta_level\n\
         10001,1997-07-30,0.1,0.2,0.3\n\
         10001,1997-07-31,0.1,0.2,0.3\n\
         10002,1997-08-31,0.4,0.5,0.6\n",
    )
    .unwrap();

    let panel = BetaPanel::from_csv(&path, default_cutoff()).unwrap();
    assert_eq!(panel.height(), 2);
    assert_eq!(
        panel.variable_list(),
        vec!["beta_PC1_unbalanced".to_string(), "beta_level".to_string()]
    );
    assert_eq!(
        panel.columns(),
        ["permno", "date", "beta_PC1_balanced", "beta_PC1_unbalanced", "beta_level"]
    );

    std::fs::remove_file(path).ok();
}

#[test]
fn test_custom_cutoff() {
    let path = std::env::temp_dir().join("disaster_sorts_betas_cutoff.csv");
    std::fs::write(
        &path,
        "permno,date_eom,beta_level\n1,2000-01-31,0.1\n1,2000-02-29,0.2\n1,2000-03-31,0.3\n",
    )
    .unwrap();

    let cutoff = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
    let panel = BetaPanel::from_csv(&path, cutoff).unwrap();
    let (first, last) = panel.date_range().unwrap().unwrap();
    assert_eq!(first, cutoff);
    assert_eq!(last, NaiveDate::from_ymd_opt(2000, 3, 31).unwrap());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("disaster_sorts_no_such_betas.csv");
    std::fs::remove_file(&path).ok();

    let err = BetaPanel::from_csv(&path, default_cutoff()).unwrap_err();
    assert!(matches!(err, DataError::Io(_)));
}

//! Sort pipeline for the disaster-risk beta panel.
//!
//! Runs one portfolio sort per beta variable against the research database,
//! reporting progress per variable.

use chrono::NaiveDate;
use indicatif::ProgressBar;
use sorts_data::error::DataError;
use sorts_data::{BetaPanel, ResearchDb};
use sorts_output::ExportFormat;
use sorts_output::labels::{days_label, display_name};
use sorts_portfolio::{BucketStats, PortfolioSorter, PortfolioSorts, SortError, SortMetric, Weighting};
use std::collections::HashMap;
use std::path::PathBuf;

/// Error type for sort pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Research database or beta panel error.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Portfolio sort error.
    #[error("Sort error: {0}")]
    Sort(#[from] SortError),
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub(crate) struct PipelineConfig {
    /// Rolling beta panel.
    pub betas: PathBuf,
    /// Directory receiving the three tables.
    pub output_dir: PathBuf,
    /// Research database.
    pub database: PathBuf,
    /// First formation month kept.
    pub start_date: NaiveDate,
    /// Number of buckets.
    pub ncuts: usize,
    /// Output file format.
    pub format: ExportFormat,
}

/// Sort every variable in `variables`, advancing `progress` once per variable.
pub(crate) fn sort_variables_with_progress(
    db: &ResearchDb,
    panel: &BetaPanel,
    variables: &[String],
    config: &PipelineConfig,
    progress: Option<&ProgressBar>,
) -> Result<HashMap<String, PortfolioSorts>, PipelineError> {
    if let Some(pb) = progress {
        pb.set_length(variables.len() as u64);
        pb.set_message("Loading characteristics...");
    }

    let sorter = PortfolioSorter::new(db, config.start_date, config.ncuts)?;

    let mut ports = HashMap::with_capacity(variables.len());
    for variable in variables {
        if let Some(pb) = progress {
            pb.set_message(variable.clone());
        }

        let sorts = sorter.sort(panel, variable)?;
        if sorts.ret.is_empty() {
            let warning = format!("Warning: no formation months for {}", variable);
            match progress {
                Some(pb) => pb.suspend(|| eprintln!("{}", warning)),
                None => eprintln!("{}", warning),
            }
        }
        ports.insert(variable.clone(), sorts);

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok(ports)
}

/// Time-series mean high-minus-low spread of the next-month return.
pub(crate) fn return_spread(sorts: &PortfolioSorts, weighting: Weighting) -> Option<f64> {
    let means = sorts.table(SortMetric::Ret).bucket_means(weighting);
    BucketStats::new(0, means).high_minus_low()
}

/// Print the per-variable return spreads.
pub(crate) fn print_spread_summary(ports: &HashMap<String, PortfolioSorts>, variables: &[String]) {
    println!("\nHigh-minus-low next-month return (time-series mean):");
    println!("─────────────────────────────────────────────────────────────");
    println!("  {:<16} {:>6} {:>12} {:>12}", "Variable", "Days", "EW", "VW");

    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |s| format!("{:.2}%", s * 100.0));
    for variable in variables {
        let Some(sorts) = ports.get(variable) else {
            continue;
        };
        println!(
            "  {:<16} {:>6} {:>12} {:>12}",
            display_name(variable),
            days_label(variable).to_string(),
            fmt(return_spread(sorts, Weighting::Equal)),
            fmt(return_spread(sorts, Weighting::Value)),
        );
    }
}

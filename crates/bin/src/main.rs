//! disaster-sorts CLI - Portfolio sorts on rolling disaster-risk betas

mod integration;

use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use integration::db_manager;
use integration::pipeline::{PipelineConfig, print_spread_summary, sort_variables_with_progress};
use sorts_data::{BetaPanel, ResearchDb};
use sorts_output::{ExportFormat, assemble, write_tables};
use sorts_portfolio::DEFAULT_NCUTS;
use std::path::PathBuf;
use std::process;
use std::time::Duration as StdDuration;

const DEFAULT_BETAS_PATH: &str = "estimated_data/disaster_risk_betas/disaster_risk_betas.csv";
const DEFAULT_OUTPUT_DIR: &str = "estimated_data/disaster_sorts";

#[derive(Debug, Parser)]
#[command(name = "disaster-sorts")]
#[command(about = "Portfolio sorts on rolling disaster-risk betas", long_about = None)]
#[command(version)]
struct Cli {
    /// Rolling beta panel (CSV)
    #[arg(long, default_value = DEFAULT_BETAS_PATH)]
    betas: PathBuf,

    /// Directory for the aggregated sort tables
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Research database (defaults to the platform data directory)
    #[arg(long, env = db_manager::DB_ENV_VAR)]
    database: Option<PathBuf>,

    /// First formation month kept (YYYY-MM-DD)
    #[arg(long, default_value = "1997-07-31")]
    start_date: NaiveDate,

    /// Number of buckets per formation month
    #[arg(long, default_value_t = DEFAULT_NCUTS)]
    ncuts: usize,

    /// Output format (csv, json, pretty-json)
    #[arg(long, default_value = "csv")]
    format: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = PipelineConfig {
        betas: cli.betas,
        output_dir: cli.output_dir,
        database: db_manager::resolve_db_path(cli.database),
        start_date: cli.start_date,
        ncuts: cli.ncuts,
        format: cli.format.parse::<ExportFormat>()?,
    };

    let db = db_manager::open_db(&config.database)?;
    print_db_info(&db, &config);
    println!();

    print!("Loading rolling betas...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let panel = BetaPanel::from_csv(&config.betas, config.start_date)?;
    println!(" ✓ ({} security-months)", panel.height());

    println!("Computing portfolio characteristics...");
    let variables = panel.variable_list();

    let pb = ProgressBar::new(variables.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));

    let ports = match sort_variables_with_progress(&db, &panel, &variables, &config, Some(&pb)) {
        Ok(ports) => {
            pb.finish_with_message(format!("Sorted {} variables", ports.len()));
            ports
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(format!("Failed to compute portfolio sorts: {}", e).into());
        }
    };

    print!("Generating output tables...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let mut tables = assemble(&ports, &variables, config.ncuts)?;
    println!(" ✓");

    print!("Replacing names...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let unmatched = tables.relabel();
    println!(" ✓");
    for raw in &unmatched {
        eprintln!("Warning: no label for {}; keeping the raw identifier", raw);
    }

    print!("Saving results...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let written = write_tables(&tables, &config.output_dir, config.format)?;
    println!(" ✓");
    for path in &written {
        println!("  {}", path.display());
    }

    print_spread_summary(&ports, &variables);

    Ok(())
}

fn print_db_info(db: &ResearchDb, config: &PipelineConfig) {
    println!("Research database: {}", config.database.display());
    match db.get_stats() {
        Ok(stats) => {
            println!(
                "  {} monthly records, {} securities, {} characteristic records",
                stats.monthly_records, stats.unique_permnos, stats.characteristic_records
            );
        }
        Err(e) => eprintln!("Warning: could not read database stats: {}", e),
    }
    println!(
        "Formation months from {}, {} buckets",
        config.start_date.format("%Y-%m-%d"),
        config.ncuts
    );
}

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;
use cloudability_export::io::excel_write::DEFAULT_BATCH_ROWS;
use cloudability_export::io::http::CloudabilityClient;
use cloudability_export::registry::ViewRegistry;
use cloudability_export::run::run_export;
use cloudability_export::{ReportError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;

    let registry = ViewRegistry::from_path(&cli.views)?;
    let client = CloudabilityClient::from_env()?;
    let output = cli.output.unwrap_or_else(default_output_path);

    run_export(
        &registry,
        &client,
        cli.start_date,
        cli.end_date,
        &output,
        cli.batch_rows,
    )
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ReportError::Logging(error.to_string()))
}

fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "cloudability_report_{}.xlsx",
        Local::now().format("%Y%m%d")
    ))
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}': expected YYYY-MM-DD"))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Export Cloudability cost reports to an Excel workbook."
)]
struct Cli {
    /// Start of the reporting period (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start_date: NaiveDate,

    /// End of the reporting period (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    end_date: NaiveDate,

    /// Path to the view registry file.
    #[arg(long, default_value = "views_config.json")]
    views: PathBuf,

    /// Output workbook path. Defaults to cloudability_report_<YYYYMMDD>.xlsx
    /// named from the run date.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of data rows written per batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_ROWS)]
    batch_rows: usize,
}

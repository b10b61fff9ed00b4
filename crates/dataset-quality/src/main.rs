//! CLI entry point for the dataset quality checker.

use anyhow::{Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dataset_quality::{QualityConfig, QualityRunner, ReportPrinter, RunReport};
use dotenv::dotenv;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data quality checks for gzip-compressed JSON tables",
    long_about = "Reads <table>.json.gz files (one JSON object per line) from a data directory \
                  and reports missing values, duplicates, type mismatches, out-of-range and \
                  invalid categorical values.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  DATASET_QUALITY_DATA_DIR    Data directory (default: data)\n  \
                  RUST_LOG                    Overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Print the first record of every file\n  \
                  dataset-quality sample\n\n  \
                  # Check every table in a directory\n  \
                  dataset-quality --data-dir ./exports check\n\n  \
                  # Check receipts only, machine-readable\n  \
                  dataset-quality check --table receipts --json"
)]
struct Args {
    /// Directory holding <table>.json.gz files
    #[arg(short, long, global = true, env = "DATASET_QUALITY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output results as JSON (disables logging)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the first valid record of each file
    Sample(TableArgs),
    /// Run every quality check and print a report per table
    Check(CheckArgs),
}

#[derive(ClapArgs, Debug)]
struct TableArgs {
    /// Only process this table (repeatable)
    #[arg(short, long = "table")]
    tables: Vec<String>,
}

#[derive(ClapArgs, Debug)]
struct CheckArgs {
    #[command(flatten)]
    filter: TableArgs,

    /// JSON schema file replacing the built-in table schemas
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Characters of a malformed line shown in diagnostics
    #[arg(long)]
    snippet_chars: Option<usize>,
}

fn init_logging(level: &str, quiet: bool, json_output: bool) {
    // Keep stdout clean for the JSON report
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(
    data_dir: Option<PathBuf>,
    tables: Vec<String>,
    schema: Option<PathBuf>,
    snippet_chars: Option<usize>,
) -> Result<QualityConfig> {
    let mut builder = QualityConfig::builder();
    if let Some(dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    for table in tables {
        builder = builder.table(table);
    }
    if let Some(path) = schema {
        builder = builder.schema_file(path);
    }
    if let Some(chars) = snippet_chars {
        builder = builder.snippet_chars(chars);
    }
    Ok(builder.build()?)
}

fn run_sample(config: QualityConfig, json: bool) -> Result<()> {
    let runner = QualityRunner::new(config)?;
    let samples = runner.sample()?;

    let mut printer = ReportPrinter::new(std::io::stdout().lock());
    if json {
        printer.print_json(&samples)?;
    } else {
        printer.print_samples(&samples)?;
    }
    printer.into_inner().flush()?;

    if samples.iter().any(|s| s.error.is_some()) {
        return Err(anyhow!("Some files could not be sampled"));
    }
    Ok(())
}

fn run_check(config: QualityConfig, json: bool) -> Result<()> {
    let runner = QualityRunner::new(config)?;
    debug!("Configuration: {:?}", runner.config());

    let report = runner.check()?;
    print_report(&report, json)?;
    log_summary(&report);

    let failed: Vec<&str> = report.failed_tables().map(|t| t.table.as_str()).collect();
    if !failed.is_empty() {
        return Err(anyhow!(
            "{} of {} tables could not be checked: {}",
            failed.len(),
            report.tables.len(),
            failed.join(", ")
        ));
    }
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    let mut printer = ReportPrinter::new(std::io::stdout().lock());
    if json {
        printer.print_json(report)?;
    } else {
        printer.print_run(report)?;
    }
    printer.into_inner().flush()?;
    Ok(())
}

fn log_summary(report: &RunReport) {
    for result in &report.tables {
        if let Some(quality) = result.report()
            && !quality.is_clean()
        {
            warn!("{}: data quality issues found", result.table);
        }
    }
    info!("Checked {} tables", report.tables.len());
}

fn main() -> Result<()> {
    // Load .env first so it can supply DATASET_QUALITY_DATA_DIR
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging (disabled if --json is set)
    init_logging(&args.log_level, args.quiet, args.json);

    match args.command {
        Command::Sample(filter) => {
            let config = build_config(args.data_dir, filter.tables, None, None)?;
            run_sample(config, args.json)
        }
        Command::Check(check) => {
            let config = build_config(
                args.data_dir,
                check.filter.tables,
                check.schema,
                check.snippet_chars,
            )?;
            run_check(config, args.json)
        }
    }
}

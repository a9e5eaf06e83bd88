//! Roll reconciliation CLI.
//!
//! Commands:
//! - `run`: reconcile one trade date from CSV source batches, export the
//!   table and replace that date in the store
//! - `dates`: list processed dates for the most recent calendar months

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use recon_core::{parse_trade_date, Config};
use recon_ingestion::load_batch;
use recon_pipeline::{ReconEngine, ReconOutput};
use recon_store::{export_csv, recent_months, write_csv_file, RollStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "roll-recon", about = "Roll trade reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile source batches for one trade date.
    Run {
        /// Trade date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output CSV file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// SQLite store receiving the reconciled rows.
        #[arg(long, default_value = "data/rolls.db")]
        store: PathBuf,

        /// Skip writing to the store.
        #[arg(long, default_value_t = false)]
        no_store: bool,

        /// Print run statistics as JSON on stderr.
        #[arg(long, default_value_t = false)]
        stats_json: bool,

        /// Source CSV batches.
        #[arg(required = true)]
        batches: Vec<PathBuf>,
    },
    /// Show processed dates for recent months.
    Dates {
        /// SQLite store to query.
        #[arg(long, default_value = "data/rolls.db")]
        store: PathBuf,

        /// Number of months to show. Defaults to the configured value.
        #[arg(long)]
        months: Option<u32>,

        /// Reference day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        today: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            date,
            config,
            output,
            store,
            no_store,
            stats_json,
            batches,
        } => run_reconcile(
            &date,
            config.as_deref(),
            output.as_deref(),
            (!no_store).then_some(store.as_path()),
            stats_json,
            &batches,
        ),
        Commands::Dates {
            store,
            months,
            today,
            config,
        } => run_dates(&store, months, today.as_deref(), config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn run_reconcile(
    date: &str,
    config: Option<&Path>,
    output: Option<&Path>,
    store: Option<&Path>,
    stats_json: bool,
    batches: &[PathBuf],
) -> Result<()> {
    let date = parse_trade_date(date)?;
    let config = load_config(config)?;
    let engine = ReconEngine::new(config)?;

    let sources = batches
        .iter()
        .map(|path| (path.display().to_string(), load_batch(path)));
    let result = engine
        .run(sources, date)
        .with_context(|| format!("reconciliation failed for {date}"))?;

    write_output(&result, output)?;

    if let Some(path) = store {
        let mut store = RollStore::open(path)
            .with_context(|| format!("failed to open store {}", path.display()))?;
        let written = store.replace_date(date, &result.rows)?;
        info!(store = %path.display(), written, "store updated");
    }

    if stats_json {
        eprintln!("{}", serde_json::to_string_pretty(&result.stats)?);
    }

    Ok(())
}

fn write_output(result: &ReconOutput, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_csv_file(path, &result.rows)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = result.rows.len(), "table exported");
        }
        None => export_csv(&result.rows, io::stdout().lock())?,
    }
    Ok(())
}

fn run_dates(
    store: &Path,
    months: Option<u32>,
    today: Option<&str>,
    config: Option<&Path>,
) -> Result<()> {
    let months = match months {
        Some(m) => m,
        None => load_config(config)?.output.calendar_months,
    };
    if months == 0 {
        bail!("--months must be at least 1");
    }

    let today: NaiveDate = match today {
        Some(raw) => parse_trade_date(raw)?,
        None => Local::now().date_naive(),
    };

    if !store.exists() {
        bail!("store {} does not exist", store.display());
    }
    let store = RollStore::open(store)?;
    let processed = store.processed_dates()?;

    for month in recent_months(today, months, &processed) {
        println!("{month}");
    }
    Ok(())
}

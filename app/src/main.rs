// In app/src/main.rs

use std::path::{Path, PathBuf};

use analytics::{AggregationEngine, EnrichedRecord, SummaryTotals};
use anyhow::{Context, Result};
use app_config::{Credentials, Settings};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use tokio::task;
use tracing_subscriber::prelude::*;

mod report;
mod source_factory;

use crate::source_factory::{connect_terminal, create_deal_source};

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Downloads trading history and keeps a trade journal workbook.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Saves the terminal login information.
    Login {
        /// The account number.
        #[arg(long)]
        login: String,

        #[arg(long)]
        password: String,

        /// The broker's trade server (e.g., "Broker-Demo").
        #[arg(long)]
        server: String,
    },

    /// Logs into the terminal with the saved login information.
    Connect,

    /// Downloads and aggregates deals, then prints the journal.
    Report {
        #[command(flatten)]
        window: Window,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Downloads and aggregates deals, then appends them to a workbook sheet.
    Export {
        #[command(flatten)]
        window: Window,

        #[command(flatten)]
        source: SourceArgs,

        /// The .xlsx workbook to append to.
        #[arg(short, long)]
        workbook: PathBuf,

        /// The sheet that receives the journal rows.
        #[arg(short, long)]
        sheet: String,

        /// Also write the win/lose/breakeven summary sheet.
        #[arg(long)]
        summary: bool,
    },

    /// Lists the sheets of a workbook.
    Sheets {
        #[arg(short, long)]
        workbook: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Window {
    /// First day of the window in YYYY-MM-DD format.
    #[arg(long)]
    start_date: String,

    /// Last day of the window (inclusive) in YYYY-MM-DD format.
    #[arg(long)]
    end_date: String,
}

impl Window {
    /// The window from the start day's midnight through the end day's last second.
    fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_day(&self.start_date, "start")?;
        let end = parse_day(&self.end_date, "end")?;
        if start > end {
            anyhow::bail!("Start date {} is after end date {}", start, end);
        }
        let start = start.and_hms_opt(0, 0, 0).context("Invalid start time")?;
        let end = end.and_hms_opt(23, 59, 59).context("Invalid end time")?;
        Ok((Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end)))
    }
}

fn parse_day(value: &str, which: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Failed to parse {} date '{}': {}", which, value, e))
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Leave opening deals out of the journal.
    #[arg(long)]
    exclude_entries: bool,

    /// Read history from a JSON snapshot instead of the terminal.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    // Only commands that talk to the terminal or aggregate need the settings.
    let settings = app_config::load_settings();

    // --- Tracing Setup ---
    let level = settings
        .as_ref()
        .ok()
        .and_then(|s| s.app.log_level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new()
            .with_target("hyper_util", tracing::Level::WARN)
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();

    if let Ok(settings) = &settings {
        tracing::info!(environment = %settings.app.environment, "Starting trade journal");
    }

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Login { login, password, server } => {
            handle_login(&required(settings)?, &login, password, server)?;
        }
        Commands::Connect => {
            connect_terminal(&required(settings)?).await?;
            println!("Connected to the trading terminal.");
        }
        Commands::Report { window, source } => {
            let (records, totals) = build_journal(&required(settings)?, &window, &source).await?;
            report::print_records(&records);
            report::print_summary(&totals);
        }
        Commands::Export { window, source, workbook, sheet, summary } => {
            let settings = required(settings)?;
            let (records, totals) = build_journal(&settings, &window, &source).await?;
            handle_export(&settings, records, totals, workbook, sheet, summary).await?;
        }
        Commands::Sheets { workbook: path } => {
            for name in sheet_names(&path)? {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn required(settings: app_config::Result<Settings>) -> Result<Settings> {
    settings.context("Failed to load configuration from config/")
}

fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let journal = workbook::open(path)?;
    Ok(journal.sheet_names())
}

// --- "Login" Subcommand Logic ---

fn handle_login(settings: &Settings, login: &str, password: String, server: String) -> Result<()> {
    let credentials = Credentials::new(login, password, server)?;
    let path = &settings.terminal.credentials_path;
    app_config::save_credentials(path, &credentials)
        .with_context(|| format!("Failed to save login information to {}", path.display()))?;
    println!("Login info saved to {}.", path.display());
    Ok(())
}

// --- Journal Building ---

/// Fetches the window's deals and orders and runs the aggregation.
async fn build_journal(
    settings: &Settings,
    window: &Window,
    source_args: &SourceArgs,
) -> Result<(Vec<EnrichedRecord>, SummaryTotals)> {
    // --- 1. Initialization & Configuration ---
    let (start, end) = window.bounds()?;
    let mut options = settings.journal.aggregate_options()?;
    if source_args.exclude_entries {
        options.include_entry_legs = false;
    }
    let pips = settings.pips.table()?;

    // --- 2. Load Data ---
    let source = create_deal_source(settings, source_args.snapshot.as_deref()).await?;
    let (legs, orders) = api_client::fetch_history(source.as_ref(), start, end)
        .await
        .context("Failed to download deals")?;

    // --- 3. Aggregate ---
    let engine = AggregationEngine::new(options);
    let (records, totals) = engine.aggregate(&legs, &orders, &pips);
    tracing::info!(count = records.len(), "{} transactions downloaded", records.len());

    Ok((records, totals))
}

// --- "Export" Subcommand Logic ---

async fn handle_export(
    settings: &Settings,
    records: Vec<EnrichedRecord>,
    totals: SummaryTotals,
    workbook_path: PathBuf,
    sheet: String,
    with_summary: bool,
) -> Result<()> {
    if records.is_empty() {
        tracing::warn!("No transactions to export.");
        if !with_summary {
            return Ok(());
        }
    }

    let summary = with_summary.then(|| (settings.journal.summary_sheet.clone(), totals.clone()));

    // The workbook is read, modified and rewritten as a whole; keep that off the async workers.
    let appended = task::spawn_blocking(move || write_journal(&workbook_path, &sheet, &records, summary)).await??;

    tracing::info!(appended = appended.appended, skipped = appended.skipped, "Export finished.");
    report::print_summary(&totals);
    Ok(())
}

/// Appends the records to `sheet` and, when given, rewrites the summary sheet.
///
/// An empty window only touches the summary sheet.
fn write_journal(
    workbook_path: &Path,
    sheet: &str,
    records: &[EnrichedRecord],
    summary: Option<(String, SummaryTotals)>,
) -> Result<workbook::AppendReport> {
    let mut journal = workbook::open(workbook_path)?;
    let report = if records.is_empty() {
        workbook::AppendReport::default()
    } else {
        journal.append_records(sheet, records)?
    };
    if let Some((summary_sheet, totals)) = &summary {
        journal.write_summary(summary_sheet, totals)?;
    }
    journal.save()?;

    if records.is_empty() {
        println!("Summary sheet updated in {}; the window had no transactions.", journal.path().display());
    } else {
        println!(
            "Transactions successfully added to sheet '{}' in {} ({} new, {} already present)",
            sheet,
            journal.path().display(),
            report.appended,
            report.skipped
        );
    }
    Ok(report)
}

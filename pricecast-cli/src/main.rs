//! PriceCast CLI: price history and LSTM forecast commands.
//!
//! Commands:
//! - `forecast`: fetch five years of daily bars, train the network and print
//!   the next 15 daily closes as a table, CSV or JSON
//! - `history`: print the price header, key statistics and recent bars for
//!   a display period
//!
//! Logs go to stderr (filter with `RUST_LOG`), results to stdout.

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pricecast_core::data::{
    DataProvider, DisplayPeriod, FileProvider, SyntheticProvider, YahooProvider,
};
use pricecast_runner::{
    export_forecast_csv, export_report_json, load_history, load_snapshot, render_forecast_table,
    render_history, render_snapshot, run_forecast, ForecastConfig, PipelineError,
};

#[derive(Parser)]
#[command(name = "pricecast", about = "PriceCast: stock price history and LSTM forecasts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on recent history and forecast the next daily closes.
    Forecast {
        /// Ticker symbol (e.g., AAPL).
        symbol: String,

        /// Path to a TOML forecast config. Defaults to the canonical model.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to read market data from.
        #[arg(long, value_enum, default_value_t = Source::Yahoo)]
        source: Source,

        /// CSV or Parquet file (required with --source file).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Seed for weight initialization and shuffling (overrides the config).
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the price header, key statistics and recent bars.
    History {
        /// Ticker symbol (e.g., AAPL).
        symbol: String,

        /// Display period: 1D, 5D, 1M, 6M, YTD, More.
        #[arg(long, default_value = "1D")]
        period: DisplayPeriod,

        /// Where to read market data from.
        #[arg(long, value_enum, default_value_t = Source::Yahoo)]
        source: Source,

        /// CSV or Parquet file (required with --source file).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Number of most recent bars to print.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    Yahoo,
    Synthetic,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            symbol,
            config,
            source,
            file,
            format,
            seed,
        } => run_forecast_cmd(&symbol, config, source, file, format, seed),
        Commands::History {
            symbol,
            period,
            source,
            file,
            rows,
        } => run_history_cmd(&symbol, period, source, file, rows),
    }
}

fn build_provider(source: Source, file: Option<PathBuf>) -> Result<Box<dyn DataProvider>> {
    let provider: Box<dyn DataProvider> = match (source, file) {
        (Source::Yahoo, _) => Box::new(YahooProvider::new()?),
        (Source::Synthetic, _) => Box::new(SyntheticProvider::new(Utc::now())),
        (Source::File, Some(path)) => Box::new(FileProvider::new(path)),
        (Source::File, None) => bail!("--source file requires --file <PATH>"),
    };
    debug!(provider = provider.name(), "selected data provider");
    Ok(provider)
}

/// Symbols pass through as typed, exchange suffix and case included.
fn normalize_symbol(raw: &str) -> &str {
    raw.trim()
}

fn run_forecast_cmd(
    symbol: &str,
    config_path: Option<PathBuf>,
    source: Source,
    file: Option<PathBuf>,
    format: Format,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ForecastConfig::from_file(&path)?,
        None => ForecastConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }

    let provider = build_provider(source, file)?;
    let symbol = normalize_symbol(symbol);

    let report = match run_forecast(provider.as_ref(), symbol, &config, Utc::now()) {
        Ok(report) => report,
        Err(err) => {
            report_failure(&err);
            std::process::exit(1);
        }
    };

    let output = match format {
        Format::Table => render_forecast_table(&report.forecast),
        Format::Csv => export_forecast_csv(&report.forecast)?,
        Format::Json => export_report_json(&report, &config)?,
    };
    print!("{output}");
    if format == Format::Json {
        println!();
    }
    Ok(())
}

fn run_history_cmd(
    symbol: &str,
    period: DisplayPeriod,
    source: Source,
    file: Option<PathBuf>,
    rows: usize,
) -> Result<()> {
    let provider = build_provider(source, file)?;
    let symbol = normalize_symbol(symbol);

    let result = load_snapshot(provider.as_ref(), symbol).and_then(|snapshot| {
        load_history(provider.as_ref(), symbol, period).map(|table| (snapshot, table))
    });
    let (snapshot, table) = match result {
        Ok(loaded) => loaded,
        Err(err) => {
            report_failure(&err);
            std::process::exit(1);
        }
    };

    print!("{}", render_snapshot(&snapshot));
    println!();
    println!("{} ({} bars)", period, table.len());
    print!("{}", render_history(&table, rows));
    Ok(())
}

/// Print user guidance for a failed request.
fn report_failure(err: &PipelineError) {
    match err {
        PipelineError::UnknownSymbol { .. } => {
            eprintln!("Error: {err}");
        }
        PipelineError::InsufficientHistory { .. } | PipelineError::Numerical(_) => {
            eprintln!("Error making predictions. Please try again later.");
            eprintln!("Details: {err}");
        }
        PipelineError::Data(_) | PipelineError::Config(_) => {
            eprintln!("Error: {err}");
        }
    }
}

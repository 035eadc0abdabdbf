//! TrendWatch CLI — analyze, export, and collect commands.
//!
//! Commands:
//! - `analyze` — fetch the last month for a symbol and print the table, trend and analysis
//! - `export` — fetch the same series and save it as `{symbol}_{date}.csv`
//! - `collect` — seed or extend the incremental observation log by one point

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use trendwatch_core::data::{PriceSource, SyntheticSource, YahooSource};
use trendwatch_core::{
    collect_one_point, export_series, CollectOutcome, IngestionPipeline, SeriesLog, TrendReport,
    TrendWatchConfig,
};

#[derive(Parser)]
#[command(
    name = "trendwatch",
    about = "TrendWatch CLI — price trend analysis and series collection"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a seeded synthetic price source instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Seed for the synthetic price source.
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent prices and classify the trend.
    Analyze {
        /// Ticker symbol (e.g., PETR4.SA, AAPL).
        #[arg(default_value = "PETR4.SA")]
        symbol: String,
    },
    /// Fetch recent prices and save them as CSV.
    Export {
        /// Ticker symbol.
        symbol: String,

        /// Output directory. Defaults to ./downloads.
        #[arg(long, default_value = "downloads")]
        out_dir: PathBuf,
    },
    /// Seed the observation log, or append one new point to it.
    Collect {
        /// Log file. Overrides `store.log_path` from the config.
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli {
        config,
        synthetic,
        seed,
        command,
    } = Cli::parse();

    let config = match config {
        Some(path) => TrendWatchConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TrendWatchConfig::default(),
    };

    match command {
        Commands::Analyze { symbol } => {
            let pipeline = build_pipeline(&config, synthetic, seed)?;
            run_analyze(&pipeline, &symbol)
        }
        Commands::Export { symbol, out_dir } => {
            let pipeline = build_pipeline(&config, synthetic, seed)?;
            run_export(&pipeline, &symbol, &out_dir)
        }
        Commands::Collect { log } => run_collect(&config, log),
    }
}

fn build_pipeline(
    config: &TrendWatchConfig,
    synthetic: bool,
    seed: u64,
) -> Result<IngestionPipeline> {
    let source: Box<dyn PriceSource> = if synthetic {
        Box::new(SyntheticSource::new(seed))
    } else {
        Box::new(YahooSource::new().context("failed to create Yahoo Finance source")?)
    };

    Ok(IngestionPipeline::new(source)
        .with_policy(config.pipeline.retry_policy())
        .with_rule(config.pipeline.trend_rule())
        .with_lookback_days(config.pipeline.lookback_days))
}

fn run_analyze(pipeline: &IngestionPipeline, symbol: &str) -> Result<()> {
    let report = pipeline.fetch_and_classify(symbol);
    print_report(&report);
    Ok(())
}

fn print_report(report: &TrendReport) {
    println!("Symbol: {}", report.symbol);
    if !report.series.is_empty() {
        println!();
        println!("{:<12} {:>12}", "Date", "Value");
        for obs in &report.series {
            println!("{:<12} {:>12.2}", obs.date, obs.value);
        }
    }
    println!();
    println!("Trend: {}", report.label);
    println!("{}", report.analysis);
}

fn run_export(pipeline: &IngestionPipeline, symbol: &str, out_dir: &Path) -> Result<()> {
    let report = pipeline.fetch_and_classify(symbol);
    if report.series.is_empty() {
        bail!("error saving data for {symbol}: check the ticker and try again");
    }

    let today = chrono::Local::now().date_naive();
    let path = export_series(&report.series, symbol, today, out_dir)?;
    println!("Saved {} observations to {}", report.series.len(), path.display());
    Ok(())
}

fn run_collect(config: &TrendWatchConfig, log_override: Option<PathBuf>) -> Result<()> {
    let path = log_override.unwrap_or_else(|| config.store.log_path.clone());
    let log = SeriesLog::new(&path);
    let today = chrono::Local::now().date_naive();

    let outcome = collect_one_point(&log, &config.store, &mut rand::thread_rng(), today)
        .with_context(|| format!("collector failed on {}", path.display()))?;

    match outcome {
        CollectOutcome::Seeded { rows } => {
            info!("historical data created");
            println!("Seeded {} with {rows} rows", path.display());
        }
        CollectOutcome::Appended { row } => {
            info!("new data point added");
            println!(
                "Appended {} {} ({}) to {}",
                row.date,
                row.value,
                row.status,
                path.display()
            );
        }
    }
    Ok(())
}

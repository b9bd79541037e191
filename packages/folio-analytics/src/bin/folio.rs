//! Folio CLI - Command line access to the portfolio analytics engine.
//!
//! Reads JSON exports and prints JSON results wrapped in `ApiResponse`.
//! Logs go to stderr so stdout stays machine readable.

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_analytics::{
    assess_signal, build_leaderboard_with, classify_trend, consistency_index,
    consistency::{highlights, monthly_rankings},
    ApiResponse, EngineConfig, FilterState, HoldingRecord, PeriodStats, RangeBucket,
    SignalInput, SignalRecord, StockPerformanceRecord, StreakSummary,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio analytics CLI - period stats, signals, leaderboards")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $FOLIO_CONFIG_FILE or ~/.folio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Period statistics and trend per stock
    Stats {
        /// Performance records JSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Lookback window in months
        #[arg(short, long)]
        period: Option<usize>,
    },
    /// Buy/hold/exit signal per stock
    Signals {
        /// Performance records JSON file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Holdings ranked by period CAGR
    Leaderboard {
        /// Performance records JSON file
        #[arg(long)]
        performance: PathBuf,
        /// Holdings JSON file
        #[arg(long)]
        holdings: PathBuf,
        /// Lookback window in months
        #[arg(short, long)]
        period: Option<usize>,
    },
    /// Monthly top and bottom performers
    Rankings {
        /// Performance records JSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Stocks listed per month on each side
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },
    /// Filter and page screening signals
    Filter {
        /// Signal records JSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Change bucket, e.g. `all`, `2-5`, `10+`
        #[arg(long)]
        change_bucket: Option<RangeBucket>,
        /// Days-until bucket, e.g. `0-7`
        #[arg(long)]
        days_bucket: Option<RangeBucket>,
        /// Page number (starts at 1)
        #[arg(long, default_value = "1")]
        page: usize,
        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Stats { input, period } => handle_stats(&config, &input, period),
        Commands::Signals { input } => handle_signals(&input),
        Commands::Leaderboard {
            performance,
            holdings,
            period,
        } => handle_leaderboard(&config, &performance, &holdings, period),
        Commands::Rankings { input, count } => handle_rankings(&input, count),
        Commands::Filter {
            input,
            change_bucket,
            days_bucket,
            page,
            page_size,
        } => handle_filter(&config, &input, change_bucket, days_bucket, page, page_size),
    });

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    let response = ApiResponse::from_result(result);

    match serde_json::to_string_pretty(&response) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("failed to serialize response: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from_path(path),
        None => EngineConfig::load(),
    };
    config.context("failed to load config")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_records(path: &Path) -> anyhow::Result<Vec<StockPerformanceRecord>> {
    let mut records: Vec<StockPerformanceRecord> = read_json(path)?;
    for record in &mut records {
        record.sort_by_month();
    }
    Ok(records)
}

fn handle_stats(
    config: &EngineConfig,
    input: &Path,
    period: Option<usize>,
) -> anyhow::Result<Value> {
    let period = period.unwrap_or(config.default_period_months);
    let records = read_records(input)?;

    let rows: Vec<Value> = records
        .iter()
        .map(|record| {
            json!({
                "isin": record.isin,
                "stockName": record.stock_name,
                "stats": PeriodStats::compute_with(&record.monthly_returns, period, &config.stats),
                "trend": classify_trend(record, period),
                "streaks": StreakSummary::from_record(record),
                "consistencyIndex": consistency_index(
                    &record.returns(),
                    config.stats.consistency_threshold,
                ),
                "volumeSpike": record.volume_spike(),
            })
        })
        .collect();

    Ok(json!({
        "periodMonths": period,
        "stocks": rows,
    }))
}

fn handle_signals(input: &Path) -> anyhow::Result<Value> {
    let records = read_records(input)?;

    let rows: Vec<Value> = records
        .iter()
        .map(|record| {
            json!({
                "isin": record.isin,
                "stockName": record.stock_name,
                "assessment": assess_signal(&SignalInput::from_record(record)),
            })
        })
        .collect();

    Ok(json!({ "stocks": rows }))
}

fn handle_leaderboard(
    config: &EngineConfig,
    performance: &Path,
    holdings: &Path,
    period: Option<usize>,
) -> anyhow::Result<Value> {
    let period = period.unwrap_or(config.default_period_months);
    let records = read_records(performance)?;
    let holdings: Vec<HoldingRecord> = read_json(holdings)?;

    let entries = build_leaderboard_with(&records, &holdings, period, &config.stats);

    Ok(json!({
        "periodMonths": period,
        "count": entries.len(),
        "entries": entries,
    }))
}

fn handle_rankings(input: &Path, count: usize) -> anyhow::Result<Value> {
    let records = read_records(input)?;
    let rankings = monthly_rankings(&records, count);
    let (repeat_top, repeat_bottom) = highlights(&rankings);

    Ok(json!({
        "months": rankings,
        "repeatTopPerformers": repeat_top,
        "repeatUnderperformers": repeat_bottom,
    }))
}

fn handle_filter(
    config: &EngineConfig,
    input: &Path,
    change_bucket: Option<RangeBucket>,
    days_bucket: Option<RangeBucket>,
    page: usize,
    page_size: Option<usize>,
) -> anyhow::Result<Value> {
    let signals: Vec<SignalRecord> = read_json(input)?;

    let state = FilterState::new(config.filters.clone())
        .edit(|criteria| {
            if let Some(bucket) = change_bucket {
                criteria.change_bucket = bucket;
            }
            if let Some(bucket) = days_bucket {
                criteria.days_until_bucket = bucket;
            }
        })
        .apply()
        .goto_page(page);

    let page = state.current_page(&signals, page_size.unwrap_or(config.page_size));

    Ok(json!({
        "filters": state.applied.criteria(),
        "page": page,
    }))
}

mod config;
mod error;
mod indicator;
mod model;
mod pattern;
mod report;
mod runner;
mod signal;
mod sink;
mod source;
mod trend;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use report::{Projection, SignalReport};
use runner::{BatchRunner, RunSettings};
use signal::SignalAggregator;
use sink::ReportSink;
use sink::json::JsonSink;
use sink::terminal::TerminalSink;
use source::MarketData;
use source::file::FileSource;
use trend::bias::TrendBias;
use trend::golden_cross::GoldenCross;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("output error")]
    Output,
    #[display("analysis error")]
    Analysis,
}

#[derive(Parser)]
#[command(
    name = "bullish-scanner",
    about = "Bullish technical-signal scanner over a market data snapshot"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Intraday signal scan over the configured universe (default)
    Scan,
    /// Golden-cross and MA/RSI bias pass over the configured universe
    Trend,
    /// Signal record for a single symbol
    Analyze { symbol: String },
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let projection = Projection::from_names(config.output.columns.as_deref())
        .change_context(AppError::Output)?;
    let sink = build_sink(&config, projection);
    let runner = build_runner(&config)?;

    // ── Shutdown ──────────────────────────────────────────────────────────────
    // ctrl+c stops the run between symbols; whatever was gathered is still
    // published.
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl+c received, stopping after the current symbol");
            ctrl_c_cancel.cancel();
        }
    });

    match cli.command.unwrap_or(Command::Scan) {
        Command::Scan => {
            let universe = config.universe.universe().change_context(AppError::Config)?;
            let symbols = runner.resolve_universe(&universe).await;
            let report = runner.scan(&symbols, &cancel).await;
            sink.publish_signals(&report).change_context(AppError::Output)?;
        }
        Command::Trend => {
            let universe = config.universe.universe().change_context(AppError::Config)?;
            let symbols = runner.resolve_universe(&universe).await;
            let report = runner.scan_trends(&symbols, &cancel).await;
            sink.publish_trends(&report).change_context(AppError::Output)?;
        }
        Command::Analyze { symbol } => {
            let symbol = symbol.trim().to_uppercase();
            let record = runner
                .analyze_symbol(&symbol)
                .await
                .change_context(AppError::Analysis)
                .attach_with(|| format!("symbol: {symbol}"))?;
            let report = SignalReport {
                records: vec![record],
                ..SignalReport::new()
            };
            sink.publish_signals(&report).change_context(AppError::Output)?;
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    // stdout carries the report, so logs go to stderr
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn build_sink(config: &AppConfig, projection: Projection) -> Box<dyn ReportSink> {
    match config.output.format.as_str() {
        "json" => Box::new(JsonSink::new(projection)),
        _ => Box::new(TerminalSink::new(projection)),
    }
}

fn build_runner(config: &AppConfig) -> Result<BatchRunner, Report<AppError>> {
    let aggregator = SignalAggregator::new(&config.signals).change_context(AppError::Config)?;

    let gc = &config.golden_cross;
    let golden_cross =
        GoldenCross::new(gc.short_period, gc.long_period, gc.lookback, gc.gap_threshold)
            .change_context(AppError::Config)?;
    let bias = TrendBias::new(
        gc.short_period,
        gc.long_period,
        gc.rsi_period,
        gc.oversold,
        gc.overbought,
    )
    .change_context(AppError::Config)?;

    let settings = RunSettings {
        intraday: config.batch.intraday().change_context(AppError::Config)?,
        trend: config.batch.trend().change_context(AppError::Config)?,
        fetch_timeout: Duration::from_secs(config.source.fetch_timeout_secs),
        delay: Duration::from_millis(config.batch.delay_ms),
    };

    let source: Arc<dyn MarketData> = Arc::new(FileSource::new(&config.source.data_dir));
    info!(
        source = source.name(),
        data_dir = %config.source.data_dir,
        delay_ms = config.batch.delay_ms,
        "market data source ready"
    );

    Ok(BatchRunner::new(source, aggregator, golden_cross, bias, settings))
}

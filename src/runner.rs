use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use error_stack::{Report, ResultExt, bail};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{SignalError, SourceError};
use crate::model::{Interval, Span};
use crate::report::{SignalReport, TrendReport};
use crate::signal::{SignalAggregator, SignalRecord};
use crate::source::MarketData;
use crate::trend::TrendRecord;
use crate::trend::bias::TrendBias;
use crate::trend::golden_cross::{Assessment, GoldenCross};

/// Which symbols a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Universe {
    TopMovers,
    Watchlist(String),
    Symbols(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub intraday: (Interval, Span),
    pub trend: (Interval, Span),
    pub fetch_timeout: Duration,
    /// Minimum gap between two symbols; zero disables pacing.
    pub delay: Duration,
}

/// Walks a symbol universe one symbol at a time.
///
/// Per-symbol failures are logged and skipped; a run always produces a
/// report, possibly empty.
pub struct BatchRunner {
    source: Arc<dyn MarketData>,
    aggregator: SignalAggregator,
    golden_cross: GoldenCross,
    bias: TrendBias,
    settings: RunSettings,
    pacer: Option<DefaultDirectRateLimiter>,
}

impl BatchRunner {
    pub fn new(
        source: Arc<dyn MarketData>,
        aggregator: SignalAggregator,
        golden_cross: GoldenCross,
        bias: TrendBias,
        settings: RunSettings,
    ) -> Self {
        // one permit per period; with_period rejects a zero duration
        let pacer = Quota::with_period(settings.delay).map(RateLimiter::direct);
        Self {
            source,
            aggregator,
            golden_cross,
            bias,
            settings,
            pacer,
        }
    }

    /// Resolve the configured universe to uppercase, de-duplicated symbols.
    ///
    /// A source failure is logged and yields an empty universe.
    pub async fn resolve_universe(&self, universe: &Universe) -> Vec<String> {
        let resolved = match universe {
            Universe::Symbols(symbols) => Ok(symbols.clone()),
            Universe::TopMovers => {
                self.with_timeout("top movers".into(), self.source.top_movers())
                    .await
            }
            Universe::Watchlist(name) => {
                self.with_timeout(format!("watchlist {name}"), self.source.watchlist(name))
                    .await
            }
        };

        let symbols = match resolved {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(error = ?e, universe = ?universe, "failed to resolve universe");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let symbols: Vec<String> = symbols
            .into_iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();

        info!(
            source = self.source.name(),
            universe = ?universe,
            symbols = symbols.len(),
            "universe resolved"
        );
        symbols
    }

    /// Intraday signal pass over `symbols`.
    pub async fn scan(&self, symbols: &[String], cancel: &CancellationToken) -> SignalReport {
        let mut report = SignalReport::new();
        if symbols.is_empty() {
            info!("empty universe, nothing to scan");
            return report;
        }

        info!(symbols = symbols.len(), run_id = %report.run_id, "signal scan started");
        for symbol in symbols {
            if !self.pace(cancel).await {
                warn!(gathered = report.records.len(), "scan cancelled");
                break;
            }
            match self.analyze_symbol(symbol).await {
                Ok(record) => report.records.push(record),
                Err(e) => warn!(symbol = %symbol, error = ?e, "skipping symbol"),
            }
        }

        info!(
            run_id = %report.run_id,
            analyzed = report.records.len(),
            skipped = symbols.len() - report.records.len(),
            "signal scan finished"
        );
        report
    }

    /// Long-horizon golden-cross and bias pass over `symbols`.
    pub async fn scan_trends(&self, symbols: &[String], cancel: &CancellationToken) -> TrendReport {
        let mut report = TrendReport::new();
        if symbols.is_empty() {
            info!("empty universe, nothing to scan");
            return report;
        }

        info!(symbols = symbols.len(), run_id = %report.run_id, "trend scan started");
        for symbol in symbols {
            if !self.pace(cancel).await {
                warn!(gathered = report.records.len(), "trend scan cancelled");
                break;
            }
            match self.analyze_trend(symbol).await {
                Ok(record) => report.records.push(record),
                Err(e) => warn!(symbol = %symbol, error = ?e, "skipping symbol"),
            }
        }

        info!(
            run_id = %report.run_id,
            analyzed = report.records.len(),
            imminent = report
                .records
                .iter()
                .filter(|r| r.golden_cross_imminent)
                .count(),
            "trend scan finished"
        );
        report
    }

    /// Quote plus intraday candles for one symbol, aggregated into a record.
    pub async fn analyze_symbol(&self, symbol: &str) -> Result<SignalRecord, Report<SignalError>> {
        let upstream = || SignalError::Upstream {
            symbol: symbol.to_owned(),
        };
        let (interval, span) = self.settings.intraday;

        let quote = self
            .with_timeout(format!("quote {symbol}"), self.source.fetch_quote(symbol))
            .await
            .change_context_lazy(upstream)?;
        let series = self
            .with_timeout(
                format!("candles {symbol} {interval}/{span}"),
                self.source.fetch_candles(symbol, interval, span),
            )
            .await
            .change_context_lazy(upstream)?;

        debug!(
            symbol,
            candles = series.len(),
            price = quote.last_trade_price,
            snapshot = ?self.aggregator.snapshot(&series),
            "fetched"
        );
        self.aggregator.aggregate(&quote, &series)
    }

    pub async fn analyze_trend(&self, symbol: &str) -> Result<TrendRecord, Report<SignalError>> {
        let (interval, span) = self.settings.trend;
        let series = self
            .with_timeout(
                format!("candles {symbol} {interval}/{span}"),
                self.source.fetch_candles(symbol, interval, span),
            )
            .await
            .change_context_lazy(|| SignalError::Upstream {
                symbol: symbol.to_owned(),
            })?;
        if series.is_empty() {
            bail!(SignalError::EmptySeries {
                symbol: symbol.to_owned(),
            });
        }

        let candles = series.candles();
        let assessment = self.golden_cross.assess(candles);
        match assessment {
            Assessment::InsufficientData {
                required,
                available,
            } => debug!(symbol, required, available, "golden cross: insufficient data"),
            Assessment::AlreadyCrossed { ma_short, ma_long } => {
                debug!(symbol, ma_short, ma_long, "golden cross already happened")
            }
            Assessment::Trend(reading) => debug!(
                symbol,
                slope_short = reading.slope_short,
                gap_slope = reading.gap_slope,
                gap_ratio = reading.gap_ratio,
                imminent = reading.imminent,
                "golden cross trend"
            ),
        }
        let golden_cross_imminent = assessment.is_imminent();
        let reading = self.bias.classify(candles);

        Ok(TrendRecord {
            symbol: series.symbol().to_owned(),
            golden_cross_imminent,
            bias: reading.bias,
            ma_short: reading.ma_short,
            ma_long: reading.ma_long,
            rsi: reading.rsi,
        })
    }

    /// Wait for the next pacing slot. Returns `false` once `cancel` fires.
    async fn pace(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        let Some(pacer) = &self.pacer else {
            return true;
        };
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = pacer.until_ready() => true,
        }
    }

    async fn with_timeout<T, F>(&self, resource: String, fut: F) -> Result<T, Report<SourceError>>
    where
        F: Future<Output = Result<T, Report<SourceError>>>,
    {
        match tokio::time::timeout(self.settings.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Report::new(SourceError::Timeout { resource })
                .attach(format!("timeout: {:?}", self.settings.fetch_timeout))),
        }
    }
}

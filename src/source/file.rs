use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::SourceError;
use crate::model::{Candle, CandleSeries, Interval, Quote, Span};
use crate::source::MarketData;

const SOURCE_NAME: &str = "file";

/// Market data read from a directory snapshot:
///
/// ```text
/// <root>/quotes/<SYMBOL>.json
/// <root>/historicals/<SYMBOL>_<interval>_<span>.json
/// <root>/top_movers.json
/// <root>/watchlists.json
/// ```
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        relative: &Path,
    ) -> Result<T, Report<SourceError>> {
        let path = self.root.join(relative);
        let resource = relative.display().to_string();

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Report::new(SourceError::NotFound {
                    source_name: SOURCE_NAME.into(),
                    resource,
                })
                .attach(format!("path: {}", path.display())));
            }
            Err(e) => {
                return Err(Report::new(e)
                    .change_context(SourceError::Read {
                        source_name: SOURCE_NAME.into(),
                        resource,
                    })
                    .attach(format!("path: {}", path.display())));
            }
        };

        debug!(path = %path.display(), bytes = bytes.len(), "read snapshot file");

        serde_json::from_slice(&bytes)
            .change_context(SourceError::ResponseParse {
                source_name: SOURCE_NAME.into(),
                resource,
            })
            .attach_with(|| format!("path: {}", path.display()))
    }
}

/// Symbols become file names; anything that could leave the directory is
/// treated as absent.
fn checked_symbol(symbol: &str) -> Result<String, Report<SourceError>> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() || symbol.contains(['/', '\\']) || symbol.contains("..") {
        return Err(Report::new(SourceError::NotFound {
            source_name: SOURCE_NAME.into(),
            resource: format!("symbol \"{symbol}\""),
        }));
    }
    Ok(symbol)
}

impl MarketData for FileSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch_quote(&self, symbol: &str) -> BoxFuture<'_, Result<Quote, Report<SourceError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let symbol = checked_symbol(&symbol)?;
            let relative = PathBuf::from("quotes").join(format!("{symbol}.json"));
            let raw: RawQuote = self.read_json(&relative).await?;
            raw.into_quote(symbol, &relative)
        })
    }

    fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        span: Span,
    ) -> BoxFuture<'_, Result<CandleSeries, Report<SourceError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            let symbol = checked_symbol(&symbol)?;
            let relative =
                PathBuf::from("historicals").join(format!("{symbol}_{interval}_{span}.json"));
            let raw: Vec<RawCandle> = self.read_json(&relative).await?;

            let candles = raw
                .into_iter()
                .map(|c| c.into_candle(&relative))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(CandleSeries::new(symbol, candles))
        })
    }

    fn top_movers(&self) -> BoxFuture<'_, Result<Vec<String>, Report<SourceError>>> {
        Box::pin(async move {
            let raw: Vec<RawMover> = self.read_json(Path::new("top_movers.json")).await?;
            Ok(raw.into_iter().map(|m| m.symbol).collect())
        })
    }

    fn watchlist(&self, name: &str) -> BoxFuture<'_, Result<Vec<String>, Report<SourceError>>> {
        let name = name.to_owned();
        Box::pin(async move {
            let raw: RawWatchlists = self.read_json(Path::new("watchlists.json")).await?;
            raw.results
                .into_iter()
                .find(|wl| wl.display_name.eq_ignore_ascii_case(&name))
                .map(|wl| wl.symbols)
                .ok_or_else(|| {
                    Report::new(SourceError::NotFound {
                        source_name: SOURCE_NAME.into(),
                        resource: format!("watchlist \"{name}\""),
                    })
                })
        })
    }
}

// ── Snapshot file types ───────────────────────────────────────────────────────

/// Prices arrive either as JSON numbers or as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn parse_error(relative: &Path, field: &str) -> Report<SourceError> {
    Report::new(SourceError::ResponseParse {
        source_name: SOURCE_NAME.into(),
        resource: relative.display().to_string(),
    })
    .attach(format!("field: {field}"))
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    last_trade_price: RawNumber,
}

impl RawQuote {
    fn into_quote(self, symbol: String, relative: &Path) -> Result<Quote, Report<SourceError>> {
        let last_trade_price = self
            .last_trade_price
            .value()
            .ok_or_else(|| parse_error(relative, "last_trade_price"))?;
        Ok(Quote {
            symbol,
            last_trade_price,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    begins_at: DateTime<Utc>,
    open_price: Option<RawNumber>,
    high_price: Option<RawNumber>,
    low_price: Option<RawNumber>,
    close_price: RawNumber,
    volume: Option<RawNumber>,
}

impl RawCandle {
    fn into_candle(self, relative: &Path) -> Result<Candle, Report<SourceError>> {
        let close = self
            .close_price
            .value()
            .ok_or_else(|| parse_error(relative, "close_price"))?;
        let optional = |field: Option<RawNumber>| field.as_ref().and_then(RawNumber::value);

        Ok(Candle {
            timestamp: self.begins_at,
            open: optional(self.open_price),
            high: optional(self.high_price),
            low: optional(self.low_price),
            close,
            volume: optional(self.volume),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawMover {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct RawWatchlists {
    results: Vec<RawWatchlist>,
}

#[derive(Debug, Deserialize)]
struct RawWatchlist {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    symbols: Vec<String>,
}

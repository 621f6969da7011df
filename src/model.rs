use std::fmt;

use chrono::{DateTime, Utc};

/// Bar width of a historical candle request.
///
/// String representations match the config file and the data-source file
/// naming (e.g. `"5minute"`, `"day"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Min5,
    Min10,
    Hour,
    Day,
    Week,
}

impl Interval {
    /// Parse a config-format string into an `Interval`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "5minute" => Some(Self::Min5),
            "10minute" => Some(Self::Min10),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min5 => "5minute",
            Self::Min10 => "10minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far back a historical candle request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Span {
    Day,
    Week,
    Month,
    Month3,
    Year,
    Year5,
}

impl Span {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "3month" => Some(Self::Month3),
            "year" => Some(Self::Year),
            "5year" => Some(Self::Year5),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Month3 => "3month",
            Self::Year => "year",
            Self::Year5 => "5year",
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One OHLCV bar. Only `close` is mandatory; absent columns stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// `Some(true)` when the bar closed above its open, `None` without an open.
    pub fn is_bullish(&self) -> Option<bool> {
        self.open.map(|open| self.close > open)
    }

    pub fn is_bearish(&self) -> Option<bool> {
        self.open.map(|open| self.close < open)
    }
}

/// Candles of exactly one symbol, strictly ascending by timestamp.
///
/// The constructor is the only way in, so the ordering invariant holds for
/// every value of this type.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Normalize raw candles into a series.
    ///
    /// Sorts by timestamp, keeps the last candle for a repeated timestamp and
    /// drops candles whose close is not a positive finite number.
    pub fn new(symbol: impl Into<String>, mut candles: Vec<Candle>) -> Self {
        let symbol = symbol.into();
        let raw_len = candles.len();

        candles.retain(|c| c.close.is_finite() && c.close > 0.0);
        candles.sort_by_key(|c| c.timestamp);

        let mut normalized: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match normalized.last_mut() {
                Some(last) if last.timestamp == candle.timestamp => *last = candle,
                _ => normalized.push(candle),
            }
        }

        if normalized.len() != raw_len {
            tracing::debug!(
                symbol = %symbol,
                raw = raw_len,
                kept = normalized.len(),
                "candle series normalized"
            );
        }

        Self {
            symbol,
            candles: normalized,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Latest trade price for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub last_trade_price: f64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, TimeZone, Utc};

    use super::Candle;

    /// Flat candles (open = high = low = close) with unit volume.
    pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                timestamp: start() + Duration::minutes(5 * i as i64),
                open: Some(c),
                high: Some(c),
                low: Some(c),
                close: c,
                volume: Some(1.0),
            })
            .collect()
    }

    /// Candles from `(open, high, low, close)` tuples.
    pub fn candles_from_ohlc(bars: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        bars.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                timestamp: start() + Duration::minutes(5 * i as i64),
                open: Some(open),
                high: Some(high),
                low: Some(low),
                close,
                volume: Some(1.0),
            })
            .collect()
    }

    /// Candles carrying only open and close, as a feed without high/low/volume.
    pub fn candles_from_open_close(bars: &[(f64, f64)]) -> Vec<Candle> {
        bars.iter()
            .enumerate()
            .map(|(i, &(open, close))| Candle {
                timestamp: start() + Duration::minutes(5 * i as i64),
                open: Some(open),
                high: None,
                low: None,
                close,
                volume: None,
            })
            .collect()
    }

    pub fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::fixtures::{candles_from_closes, start};
    use super::*;

    #[test]
    fn interval_round_trip() {
        let intervals = [
            ("5minute", Interval::Min5),
            ("10minute", Interval::Min10),
            ("hour", Interval::Hour),
            ("day", Interval::Day),
            ("week", Interval::Week),
        ];
        for (s, interval) in intervals {
            assert_eq!(Interval::from_str(s), Some(interval));
            assert_eq!(interval.as_str(), s);
        }
    }

    #[test]
    fn span_invalid_string_returns_none() {
        assert_eq!(Span::from_str("2year"), None);
        assert_eq!(Span::from_str(""), None);
        assert_eq!(Span::from_str("3month"), Some(Span::Month3));
    }

    #[test]
    fn series_sorts_by_timestamp() {
        let mut candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        candles.reverse();
        let series = CandleSeries::new("AAPL", candles);
        let closes: Vec<f64> = series.candles().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert!(
            series
                .candles()
                .windows(2)
                .all(|w| w[0].timestamp < w[1].timestamp)
        );
    }

    #[test]
    fn series_collapses_duplicate_timestamps() {
        let mut candles = candles_from_closes(&[1.0, 2.0]);
        let mut dup = candles[1].clone();
        dup.close = 5.0;
        candles.push(dup);
        let series = CandleSeries::new("AAPL", candles);
        assert_eq!(series.len(), 2);
        assert_eq!(series.candles().last().map(|c| c.close), Some(5.0));
    }

    #[test]
    fn series_drops_unusable_closes() {
        let mut candles = candles_from_closes(&[1.0, 2.0]);
        candles.push(Candle {
            timestamp: start() + Duration::hours(1),
            open: None,
            high: None,
            low: None,
            close: f64::NAN,
            volume: None,
        });
        candles[0].close = 0.0;
        let series = CandleSeries::new("AAPL", candles);
        assert_eq!(series.len(), 1);
        assert_eq!(series.symbol(), "AAPL");
    }

    #[test]
    fn empty_series_is_valid() {
        let series = CandleSeries::new("AAPL", Vec::new());
        assert!(series.is_empty());
        assert!(series.candles().last().is_none());
    }

    #[test]
    fn candle_direction_requires_open() {
        let mut candle = candles_from_closes(&[10.0]).remove(0);
        candle.open = Some(9.0);
        assert_eq!(candle.is_bullish(), Some(true));
        assert_eq!(candle.is_bearish(), Some(false));
        candle.open = None;
        assert_eq!(candle.is_bullish(), None);
    }
}

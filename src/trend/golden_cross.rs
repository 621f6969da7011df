//! Golden-cross-imminent heuristic.
//!
//! Fits nothing: it compares the first and last points of a short lookback
//! window of two simple moving averages. A rising short MA, a shrinking gap to
//! the long MA and a small relative gap together read as "a cross is near".
//! Expect both false positives and false negatives.

use error_stack::{Report, bail};
use tracing::debug;

use crate::error::IndicatorError;
use crate::indicator::ma::Sma;
use crate::indicator::{Indicator, close_prices, last_value, tail};
use crate::model::Candle;

/// Statistics over the lookback window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendReading {
    pub ma_short: f64,
    pub ma_long: f64,
    pub slope_short: f64,
    pub gap_slope: f64,
    pub gap_ratio: f64,
    pub imminent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assessment {
    InsufficientData { required: usize, available: usize },
    AlreadyCrossed { ma_short: f64, ma_long: f64 },
    Trend(TrendReading),
}

impl Assessment {
    pub fn is_imminent(&self) -> bool {
        matches!(self, Self::Trend(reading) if reading.imminent)
    }
}

#[derive(Debug, Clone)]
pub struct GoldenCross {
    short: Sma,
    long: Sma,
    lookback: usize,
    gap_threshold: f64,
}

impl GoldenCross {
    pub fn new(
        short_period: usize,
        long_period: usize,
        lookback: usize,
        gap_threshold: f64,
    ) -> Result<Self, Report<IndicatorError>> {
        if short_period >= long_period {
            bail!(IndicatorError::InvalidParameter {
                name: "short_period must be < long_period".into(),
            });
        }
        if lookback == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "lookback must be > 0".into(),
            });
        }
        if !gap_threshold.is_finite() {
            bail!(IndicatorError::InvalidParameter {
                name: "gap_threshold must be finite".into(),
            });
        }
        Ok(Self {
            short: Sma::new(short_period)?,
            long: Sma::new(long_period)?,
            lookback,
            gap_threshold,
        })
    }

    pub fn assess(&self, candles: &[Candle]) -> Assessment {
        let required = self.long.required_candles();
        if candles.len() < required {
            debug!(required, available = candles.len(), "golden cross: insufficient data");
            return Assessment::InsufficientData {
                required,
                available: candles.len(),
            };
        }

        let prices = close_prices(candles);
        let ma_short = self.short.calculate_prices(&prices);
        let ma_long = self.long.calculate_prices(&prices);

        // both are defined once len >= long period
        let (Some(current_short), Some(current_long)) =
            (last_value(&ma_short), last_value(&ma_long))
        else {
            return Assessment::InsufficientData {
                required,
                available: candles.len(),
            };
        };
        if current_short >= current_long {
            return Assessment::AlreadyCrossed {
                ma_short: current_short,
                ma_long: current_long,
            };
        }

        let clean: Vec<(f64, f64)> = ma_short
            .iter()
            .zip(&ma_long)
            .filter_map(|(s, l)| Some(((*s)?, (*l)?)))
            .collect();
        let Some(window) = tail(&clean, self.lookback) else {
            debug!(
                lookback = self.lookback,
                clean = clean.len(),
                "golden cross: insufficient clean points in lookback"
            );
            return Assessment::InsufficientData {
                required: required + self.lookback - 1,
                available: candles.len(),
            };
        };

        let (first_short, first_long) = window[0];
        let lookback = self.lookback as f64;
        let slope_short = (current_short - first_short) / lookback;
        let gap_slope = ((current_long - current_short) - (first_long - first_short)) / lookback;
        let gap_ratio = (current_long - current_short) / current_long;
        let imminent = slope_short > 0.0 && gap_slope < 0.0 && gap_ratio <= self.gap_threshold;

        Assessment::Trend(TrendReading {
            ma_short: current_short,
            ma_long: current_long,
            slope_short,
            gap_slope,
            gap_ratio,
            imminent,
        })
    }
}

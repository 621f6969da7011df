use std::fmt;

use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::ma::Sma;
use crate::indicator::rsi::Rsi;
use crate::model::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Buy,
    Sell,
    Hold,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasReading {
    pub bias: Bias,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
}

/// Moving-average regime filtered by RSI extremes: buy an oversold dip in an
/// uptrend, sell an overbought rally in a downtrend.
#[derive(Debug, Clone)]
pub struct TrendBias {
    short: Sma,
    long: Sma,
    rsi: Rsi,
    oversold: f64,
    overbought: f64,
}

impl TrendBias {
    pub fn new(
        short_period: usize,
        long_period: usize,
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    ) -> Result<Self, Report<IndicatorError>> {
        if short_period >= long_period {
            bail!(IndicatorError::InvalidParameter {
                name: "short_period must be < long_period".into(),
            });
        }
        if !(0.0..=100.0).contains(&oversold)
            || !(0.0..=100.0).contains(&overbought)
            || oversold >= overbought
        {
            bail!(IndicatorError::InvalidParameter {
                name: "rsi thresholds must satisfy 0 <= oversold < overbought <= 100".into(),
            });
        }
        Ok(Self {
            short: Sma::new(short_period)?,
            long: Sma::new(long_period)?,
            rsi: Rsi::new(rsi_period)?,
            oversold,
            overbought,
        })
    }

    pub fn classify(&self, candles: &[Candle]) -> BiasReading {
        let ma_short = self.short.latest(candles);
        let ma_long = self.long.latest(candles);
        let rsi = self.rsi.latest(candles);

        let bias = match (ma_short, ma_long, rsi) {
            (Some(short), Some(long), Some(rsi)) if short > long && rsi < self.oversold => {
                Bias::Buy
            }
            (Some(short), Some(long), Some(rsi)) if short < long && rsi > self.overbought => {
                Bias::Sell
            }
            _ => Bias::Hold,
        };

        BiasReading {
            bias,
            ma_short,
            ma_long,
            rsi,
        }
    }
}

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, align_series, close_prices};
use crate::model::Candle;

/// RSI (Relative Strength Index) over a plain rolling mean of gains and
/// losses. No Wilder smoothing.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

        let values = deltas
            .windows(self.period)
            .map(|window| {
                let avg_gain =
                    window.iter().map(|&d| d.max(0.0)).sum::<f64>() / self.period as f64;
                let avg_loss =
                    window.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / self.period as f64;
                rsi_value(avg_gain, avg_loss)
            })
            .collect();

        align_series(prices.len(), values)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        self.calculate_prices(&close_prices(candles))
    }
}

/// Gains with no losses saturate at 100; a window with neither is undefined.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

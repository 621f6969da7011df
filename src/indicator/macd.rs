use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::ma::Ema;

/// One MACD observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast: Ema::new(fast_period)?,
            slow: Ema::new(slow_period)?,
            signal: Ema::new(signal_period)?,
        })
    }

    /// MACD line, signal line and histogram at every index.
    ///
    /// All three EMAs are seeded with their first input, so the output has the
    /// same length as `prices` with no undefined head.
    pub fn calculate_full(&self, prices: &[f64]) -> Vec<MacdPoint> {
        let fast_ema = self.fast.calculate_prices(prices);
        let slow_ema = self.slow.calculate_prices(prices);

        let macd_line: Vec<f64> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();
        let signal_line = self.signal.calculate_prices(&macd_line);

        macd_line
            .into_iter()
            .zip(signal_line)
            .map(|(line, signal)| MacdPoint {
                line,
                signal,
                histogram: line - signal,
            })
            .collect()
    }
}

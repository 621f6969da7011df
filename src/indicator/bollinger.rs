use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{align_series, mean};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Bollinger Bands around an SMA, using the sample standard deviation of the
/// window (n - 1 denominator).
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        if period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be >= 2".into(),
            });
        }
        if !std_dev_multiplier.is_finite() || std_dev_multiplier < 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "std_dev_multiplier must be finite and >= 0".into(),
            });
        }
        Ok(Self {
            period,
            std_dev_multiplier,
        })
    }

    /// Bands at every index; the first `period - 1` entries are `None`.
    pub fn calculate_bands(&self, prices: &[f64]) -> Vec<Option<Bands>> {
        let bands = prices
            .windows(self.period)
            .map(|window| {
                let middle = mean(window);
                let variance = window.iter().map(|&p| (p - middle).powi(2)).sum::<f64>()
                    / (self.period - 1) as f64;
                let offset = self.std_dev_multiplier * variance.sqrt();
                Some(Bands {
                    upper: middle + offset,
                    middle,
                    lower: middle - offset,
                })
            })
            .collect();

        align_series(prices.len(), bands)
    }
}

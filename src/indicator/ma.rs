use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, align_series, close_prices, mean};
use crate::model::Candle;

/// Simple Moving Average.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Trailing mean at every index; the first `period - 1` entries are `None`.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let values = prices.windows(self.period).map(|w| Some(mean(w))).collect();
        align_series(prices.len(), values)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        self.calculate_prices(&close_prices(candles))
    }
}

/// Exponential Moving Average, recursive form seeded with the first price.
#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, Report<IndicatorError>> {
        if span == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "span must be > 0".into(),
            });
        }
        Ok(Self { span })
    }

    /// EMA at every index, defined from index 0.
    pub fn calculate_prices(&self, prices: &[f64]) -> Vec<f64> {
        let alpha = 2.0 / (self.span as f64 + 1.0);
        let mut results = Vec::with_capacity(prices.len());
        let mut iter = prices.iter();

        let Some(&seed) = iter.next() else {
            return results;
        };
        let mut ema = seed;
        results.push(ema);

        for &price in iter {
            ema = alpha * price + (1.0 - alpha) * ema;
            results.push(ema);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::candles_from_closes;

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_insufficient_data_is_undefined() {
        let sma = Sma::new(5).unwrap();
        let values = sma.calculate(&candles_from_closes(&[1.0; 4]));
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn sma_flat_prices() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&candles_from_closes(&[100.3; 5]));
        assert_eq!(values.len(), 5);
        assert_eq!(values[..2], [None, None]);
        assert!(values[2..].iter().all(|v| *v == Some(100.3)));

        let long = Sma::new(20).unwrap().calculate_prices(&[0.3; 25]);
        assert!(long[19..].iter().all(|v| *v == Some(0.3)));
    }

    #[test]
    fn sma_known_value() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&candles_from_closes(&[1.0, 2.0, 3.0, 4.0]));
        // (1+2+3)/3 = 2.0, (2+3+4)/3 = 3.0
        assert!((values[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((values[3].unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn sma_empty_input() {
        let sma = Sma::new(3).unwrap();
        assert!(sma.calculate(&[]).is_empty());
        assert_eq!(sma.latest(&[]), None);
    }

    #[test]
    fn ema_span_zero_invalid() {
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn ema_flat_prices() {
        let ema = Ema::new(3).unwrap();
        let values = ema.calculate_prices(&[10.0; 6]);
        assert_eq!(values, vec![10.0; 6]);
    }

    #[test]
    fn ema_seeded_with_first_price() {
        let ema = Ema::new(3).unwrap();
        let values = ema.calculate_prices(&[1.0, 2.0, 3.0]);
        // alpha = 0.5: 1.0, 1.5, 2.25
        assert!((values[0] - 1.0).abs() < 1e-9);
        assert!((values[1] - 1.5).abs() < 1e-9);
        assert!((values[2] - 2.25).abs() < 1e-9);
    }

    #[test]
    fn ema_does_not_mutate_input() {
        let prices = vec![3.0, 1.0, 2.0];
        let before = prices.clone();
        let first = Ema::new(2).unwrap().calculate_prices(&prices);
        let second = Ema::new(2).unwrap().calculate_prices(&prices);
        assert_eq!(prices, before);
        assert_eq!(first, second);
    }
}

use error_stack::{Report, bail};
use serde::Serialize;
use tracing::debug;

use crate::config::SignalsConfig;
use crate::error::{IndicatorError, SignalError};
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::ma::Sma;
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::indicator::volume::VolumeMA;
use crate::indicator::{Indicator, close_prices, last_value};
use crate::model::{CandleSeries, Quote};
use crate::pattern::Pattern;
use crate::pattern::bollinger_bounce::BollingerBounce;
use crate::pattern::candlestick::{BullishEngulfing, BullishHammer};
use crate::pattern::macd_cross::BullishMacdCrossover;
use crate::pattern::volume_spike::VolumeSpike;

/// Indicator values at the last candle of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

/// One row of a signal report. Field order is the report's column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub symbol: String,
    pub last_trade_price: f64,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub basic_criteria: bool,
    pub bullish_macd: bool,
    pub bollinger_bounce: bool,
    pub volume_spike: bool,
    pub bullish_engulfing: bool,
    pub bullish_hammer: bool,
}

/// Combines a quote and an intraday series into a `SignalRecord`.
///
/// Holds only parameters, so one instance serves every symbol of a run.
#[derive(Debug, Clone)]
pub struct SignalAggregator {
    ma_short: Sma,
    ma_long: Sma,
    rsi: Rsi,
    rsi_ceiling: f64,
    macd: Macd,
    bands: BollingerBands,
    macd_cross: BullishMacdCrossover,
    bounce: BollingerBounce,
    volume_spike: VolumeSpike,
    engulfing: BullishEngulfing,
    hammer: BullishHammer,
}

impl SignalAggregator {
    pub fn new(config: &SignalsConfig) -> Result<Self, Report<IndicatorError>> {
        if config.ma_short >= config.ma_long {
            bail!(IndicatorError::InvalidParameter {
                name: "signals.ma_short must be < signals.ma_long".into(),
            });
        }
        if !(0.0..=100.0).contains(&config.rsi_ceiling) {
            bail!(IndicatorError::InvalidParameter {
                name: "signals.rsi_ceiling must be within 0..=100".into(),
            });
        }

        let macd = Macd::new(config.macd_fast, config.macd_slow, config.macd_signal)?;
        let bands = BollingerBands::new(config.bollinger_period, config.bollinger_std)?;

        Ok(Self {
            ma_short: Sma::new(config.ma_short)?,
            ma_long: Sma::new(config.ma_long)?,
            rsi: Rsi::new(config.rsi_period)?,
            rsi_ceiling: config.rsi_ceiling,
            macd_cross: BullishMacdCrossover::new(macd.clone()),
            bounce: BollingerBounce::new(bands.clone(), config.bounce_tolerance)?,
            volume_spike: VolumeSpike::new(
                VolumeMA::new(config.volume_period)?,
                config.volume_multiplier,
            )?,
            engulfing: BullishEngulfing,
            hammer: BullishHammer::default(),
            macd,
            bands,
        })
    }

    pub fn snapshot(&self, series: &CandleSeries) -> IndicatorSnapshot {
        let candles = series.candles();
        let prices = close_prices(candles);
        let macd = self.macd.calculate_full(&prices).last().copied();
        let bands = last_value(&self.bands.calculate_bands(&prices));

        IndicatorSnapshot {
            sma_short: self.ma_short.latest(candles),
            sma_long: self.ma_long.latest(candles),
            rsi: self.rsi.latest(candles),
            macd_line: macd.map(|p| p.line),
            macd_signal: macd.map(|p| p.signal),
            macd_histogram: macd.map(|p| p.histogram),
            bollinger_middle: bands.map(|b| b.middle),
            bollinger_upper: bands.map(|b| b.upper),
            bollinger_lower: bands.map(|b| b.lower),
        }
    }

    pub fn aggregate(
        &self,
        quote: &Quote,
        series: &CandleSeries,
    ) -> Result<SignalRecord, Report<SignalError>> {
        let price = quote.last_trade_price;
        if !price.is_finite() || price <= 0.0 {
            bail!(SignalError::InvalidQuote {
                symbol: quote.symbol.clone(),
                price,
            });
        }
        if series.is_empty() {
            bail!(SignalError::EmptySeries {
                symbol: series.symbol().to_owned(),
            });
        }

        let candles = series.candles();
        if candles.len() < self.ma_long.required_candles() {
            debug!(
                symbol = %quote.symbol,
                indicator = self.ma_long.name(),
                required = self.ma_long.required_candles(),
                available = candles.len(),
                "series shorter than the long moving average"
            );
        }

        let ma_short = self.ma_short.latest(candles);
        let ma_long = self.ma_long.latest(candles);
        let rsi = self.rsi.latest(candles);

        let basic_criteria = match (ma_short, ma_long, rsi) {
            (Some(short), Some(long), Some(rsi)) => {
                price > short && short > long && rsi < self.rsi_ceiling
            }
            _ => false,
        };

        let record = SignalRecord {
            symbol: quote.symbol.clone(),
            last_trade_price: price,
            ma_short,
            ma_long,
            rsi,
            basic_criteria,
            bullish_macd: self.macd_cross.detect(candles),
            bollinger_bounce: self.bounce.detect(candles),
            volume_spike: self.volume_spike.detect(candles),
            bullish_engulfing: self.engulfing.detect(candles),
            bullish_hammer: self.hammer.detect(candles),
        };

        debug!(
            symbol = %record.symbol,
            candles = candles.len(),
            basic_criteria = record.basic_criteria,
            bullish_macd = record.bullish_macd,
            bollinger_bounce = record.bollinger_bounce,
            volume_spike = record.volume_spike,
            bullish_engulfing = record.bullish_engulfing,
            bullish_hammer = record.bullish_hammer,
            "signals aggregated"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Candle;
    use crate::model::fixtures::candles_from_closes;

    fn aggregator() -> SignalAggregator {
        SignalAggregator::new(&SignalsConfig::default()).unwrap()
    }

    fn quote(price: f64) -> Quote {
        Quote {
            symbol: "ACME".into(),
            last_trade_price: price,
        }
    }

    /// 200 rising bars; the last two form a bullish engulfing pair and the
    /// last one carries a volume spike.
    fn rising_with_breakout() -> Vec<Candle> {
        let closes: Vec<f64> = (0..200).map(|i| 100.0 + 0.5 * i as f64).collect();
        let mut candles = candles_from_closes(&closes);
        for candle in &mut candles {
            candle.volume = Some(1000.0);
        }

        let n = candles.len();
        // bearish bar 198: open 200, close 198
        candles[n - 2].open = Some(200.0);
        candles[n - 2].high = Some(200.5);
        candles[n - 2].low = Some(197.5);
        candles[n - 2].close = 198.0;
        // bullish bar 199 engulfing it: open 197, close 201
        candles[n - 1].open = Some(197.0);
        candles[n - 1].high = Some(201.5);
        candles[n - 1].low = Some(196.5);
        candles[n - 1].close = 201.0;
        candles[n - 1].volume = Some(5000.0);
        candles
    }

    #[test]
    fn rising_series_end_to_end() {
        let series = CandleSeries::new("ACME", rising_with_breakout());
        let record = aggregator().aggregate(&quote(202.0), &series).unwrap();

        assert_eq!(record.symbol, "ACME");
        assert_eq!(record.last_trade_price, 202.0);
        assert!(record.bullish_engulfing);
        assert!(record.volume_spike);
        assert!(!record.bullish_hammer);

        let (short, long, rsi) = (
            record.ma_short.unwrap(),
            record.ma_long.unwrap(),
            record.rsi.unwrap(),
        );
        assert!(short > long);
        let expected = 202.0 > short && short > long && rsi < 70.0;
        assert_eq!(record.basic_criteria, expected);
    }

    #[test]
    fn overbought_rsi_fails_basic_criteria() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = CandleSeries::new("ACME", candles_from_closes(&closes));
        let record = aggregator().aggregate(&quote(170.0), &series).unwrap();
        assert_eq!(record.rsi, Some(100.0));
        assert!(!record.basic_criteria);
    }

    #[test]
    fn basic_criteria_with_moderate_rsi() {
        // two steps up for every step down: 9 gains, 5 losses in the last 14 deltas
        let mut closes = Vec::new();
        let mut price = 100.0;
        for i in 0..60 {
            price += if i % 3 == 2 { -1.0 } else { 1.0 };
            closes.push(price);
        }
        let series = CandleSeries::new("ACME", candles_from_closes(&closes));
        let record = aggregator().aggregate(&quote(150.0), &series).unwrap();
        let rsi = record.rsi.unwrap();
        assert!(rsi < 70.0, "rsi {rsi}");
        assert!(record.basic_criteria);
    }

    #[test]
    fn short_series_has_no_moving_averages() {
        let series = CandleSeries::new("ACME", candles_from_closes(&[10.0, 11.0, 12.0]));
        let record = aggregator().aggregate(&quote(12.0), &series).unwrap();
        assert_eq!(record.ma_short, None);
        assert_eq!(record.ma_long, None);
        assert_eq!(record.rsi, None);
        assert!(!record.basic_criteria);
        assert!(!record.bullish_macd);
        assert!(!record.bollinger_bounce);
        assert!(!record.volume_spike);
    }

    #[test]
    fn invalid_quote_rejected() {
        let series = CandleSeries::new("ACME", candles_from_closes(&[10.0; 3]));
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(aggregator().aggregate(&quote(price), &series).is_err());
        }
    }

    #[test]
    fn empty_series_rejected() {
        let series = CandleSeries::new("ACME", Vec::new());
        assert!(aggregator().aggregate(&quote(10.0), &series).is_err());
    }

    #[test]
    fn snapshot_matches_window_lengths() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let series = CandleSeries::new("ACME", candles_from_closes(&closes));
        let snapshot = aggregator().snapshot(&series);
        assert_eq!(snapshot.sma_short, Some(74.5));
        assert_eq!(snapshot.sma_long, None);
        assert_eq!(snapshot.rsi, Some(100.0));
        assert!(snapshot.macd_line.unwrap() > 0.0);
        let (upper, middle, lower) = (
            snapshot.bollinger_upper.unwrap(),
            snapshot.bollinger_middle.unwrap(),
            snapshot.bollinger_lower.unwrap(),
        );
        assert_eq!(middle, 69.5);
        assert!(upper > middle && middle > lower);

        let empty = CandleSeries::new("ACME", Vec::new());
        assert_eq!(aggregator().snapshot(&empty), IndicatorSnapshot::default());
    }

    #[test]
    fn misordered_moving_averages_rejected() {
        let config = SignalsConfig {
            ma_short: 50,
            ma_long: 10,
            ..SignalsConfig::default()
        };
        assert!(SignalAggregator::new(&config).is_err());
    }
}

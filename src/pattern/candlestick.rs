use crate::indicator::tail;
use crate::model::Candle;
use crate::pattern::Pattern;

/// Bearish bar followed by a bullish bar whose body engulfs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishEngulfing;

impl Pattern for BullishEngulfing {
    fn name(&self) -> &str {
        "bullish_engulfing"
    }

    fn evaluate(&self, candles: &[Candle]) -> Option<bool> {
        let [prev, curr] = tail(candles, 2)? else {
            return None;
        };
        let (prev_open, curr_open) = (prev.open?, curr.open?);

        let reversal = prev.is_bearish()? && curr.is_bullish()?;
        let engulfs = curr_open < prev.close && curr.close > prev_open;
        Some(reversal && engulfs)
    }
}

/// Small body near the top of the range with a long lower shadow.
#[derive(Debug, Clone, Copy)]
pub struct BullishHammer {
    max_body_ratio: f64,
    min_shadow_ratio: f64,
}

impl Default for BullishHammer {
    fn default() -> Self {
        Self {
            max_body_ratio: 0.3,
            min_shadow_ratio: 2.0,
        }
    }
}

impl Pattern for BullishHammer {
    fn name(&self) -> &str {
        "bullish_hammer"
    }

    fn evaluate(&self, candles: &[Candle]) -> Option<bool> {
        let latest = candles.last()?;
        let (open, high, low) = (latest.open?, latest.high?, latest.low?);

        let body = (latest.close - open).abs();
        let range = high - low;
        // ratios below are undefined for a flat bar or a doji
        if range <= 0.0 || body <= 0.0 {
            return None;
        }

        let lower_shadow = open.min(latest.close) - low;
        Some(body / range < self.max_body_ratio && lower_shadow / body > self.min_shadow_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{candles_from_closes, candles_from_ohlc, candles_from_open_close};

    #[test]
    fn engulfing_after_bearish_bar() {
        let candles = candles_from_open_close(&[(10.0, 9.0), (8.5, 10.5)]);
        assert_eq!(BullishEngulfing.evaluate(&candles), Some(true));
    }

    #[test]
    fn bearish_reversal_is_not_bullish_engulfing() {
        let candles = candles_from_open_close(&[(9.0, 10.0), (10.5, 8.5)]);
        assert_eq!(BullishEngulfing.evaluate(&candles), Some(false));
    }

    #[test]
    fn partial_body_overlap_is_not_engulfing() {
        let candles = candles_from_open_close(&[(10.0, 9.0), (9.5, 10.5)]);
        assert!(!BullishEngulfing.detect(&candles));
    }

    #[test]
    fn engulfing_uses_only_last_two_bars() {
        let candles = candles_from_open_close(&[(1.0, 50.0), (10.0, 9.0), (8.5, 10.5)]);
        assert!(BullishEngulfing.detect(&candles));
    }

    #[test]
    fn engulfing_needs_two_bars_and_opens() {
        let one = candles_from_open_close(&[(8.5, 10.5)]);
        assert_eq!(BullishEngulfing.evaluate(&one), None);

        let mut no_open = candles_from_open_close(&[(10.0, 9.0), (8.5, 10.5)]);
        no_open[0].open = None;
        assert_eq!(BullishEngulfing.evaluate(&no_open), None);
        assert!(!BullishEngulfing.detect(&no_open));
    }

    #[test]
    fn hammer_detected() {
        // body 0.2, range 1.3, lower shadow 1.0
        let candles = candles_from_ohlc(&[(10.0, 10.3, 9.0, 10.2)]);
        assert_eq!(BullishHammer::default().evaluate(&candles), Some(true));
    }

    #[test]
    fn large_body_is_not_hammer() {
        let candles = candles_from_ohlc(&[(10.0, 11.2, 9.9, 11.0)]);
        assert_eq!(BullishHammer::default().evaluate(&candles), Some(false));
    }

    #[test]
    fn short_lower_shadow_is_not_hammer() {
        // body 0.2, range 1.2, lower shadow 0.3 (1.5x body)
        let candles = candles_from_ohlc(&[(10.0, 10.9, 9.7, 10.2)]);
        assert_eq!(BullishHammer::default().evaluate(&candles), Some(false));
    }

    #[test]
    fn degenerate_bars_are_no_signal() {
        let doji = candles_from_ohlc(&[(10.0, 10.5, 9.0, 10.0)]);
        assert_eq!(BullishHammer::default().evaluate(&doji), None);

        let flat = candles_from_closes(&[10.0]);
        assert!(!BullishHammer::default().detect(&flat));
    }

    #[test]
    fn hammer_needs_high_and_low() {
        let candles = candles_from_open_close(&[(10.0, 10.2)]);
        assert_eq!(BullishHammer::default().evaluate(&candles), None);
        assert!(!BullishHammer::default().detect(&[]));
    }
}

use crate::indicator::macd::Macd;
use crate::indicator::{close_prices, tail};
use crate::model::Candle;
use crate::pattern::Pattern;

/// MACD line crossing strictly above its signal line on the latest bar.
#[derive(Debug, Clone)]
pub struct BullishMacdCrossover {
    macd: Macd,
}

impl BullishMacdCrossover {
    pub fn new(macd: Macd) -> Self {
        Self { macd }
    }
}

impl Pattern for BullishMacdCrossover {
    fn name(&self) -> &str {
        "bullish_macd"
    }

    fn evaluate(&self, candles: &[Candle]) -> Option<bool> {
        let points = self.macd.calculate_full(&close_prices(candles));
        let [prev, curr] = tail(&points, 2)? else {
            return None;
        };
        Some(prev.line < prev.signal && curr.line > curr.signal)
    }
}

pub mod bollinger_bounce;
pub mod candlestick;
pub mod macd_cross;
pub mod volume_spike;

use crate::model::Candle;

/// A bullish pattern read off the tail of a candle series.
pub trait Pattern: Send + Sync {
    fn name(&self) -> &str;

    /// `Some(found)` when the candles carry enough history and columns to
    /// decide, `None` otherwise.
    fn evaluate(&self, candles: &[Candle]) -> Option<bool>;

    /// Undecidable counts as "no signal".
    fn detect(&self, candles: &[Candle]) -> bool {
        match self.evaluate(candles) {
            Some(found) => found,
            None => {
                tracing::trace!(
                    pattern = self.name(),
                    candles = candles.len(),
                    "pattern undecidable, reporting no signal"
                );
                false
            }
        }
    }
}

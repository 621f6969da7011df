pub mod bollinger;
pub mod ma;
pub mod macd;
pub mod rsi;
pub mod volume;

use crate::model::Candle;

/// A technical analysis indicator that operates on a slice of candles.
///
/// Candles must be in ascending chronological order (oldest first). Output is
/// aligned index-for-index with the input; positions without a full window
/// hold `None`.
pub trait Indicator: Send + Sync {
    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Minimum number of candles required to produce at least one defined value.
    fn required_candles(&self) -> usize;

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>>;

    /// Value at the last candle, if defined.
    fn latest(&self, candles: &[Candle]) -> Option<f64> {
        last_value(&self.calculate(candles))
    }
}

/// Extract close prices from a slice of candles.
pub fn close_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Extract volumes from a slice of candles.
pub fn volumes(candles: &[Candle]) -> Vec<Option<f64>> {
    candles.iter().map(|c| c.volume).collect()
}

/// The trailing `len` elements of `values`, or `None` when there are fewer.
///
/// Every "not enough history" decision in the crate goes through here.
pub fn tail<T>(values: &[T], len: usize) -> Option<&[T]> {
    values.len().checked_sub(len).map(|start| &values[start..])
}

/// Last element of an aligned series, flattened.
pub fn last_value<T: Copy>(series: &[Option<T>]) -> Option<T> {
    series.last().copied().flatten()
}

/// Left-pad `values` with `None` so they line up with the last `values.len()`
/// positions of a series of `total_len` elements.
pub fn align_series<T: Clone>(total_len: usize, values: Vec<Option<T>>) -> Vec<Option<T>> {
    let offset = total_len.saturating_sub(values.len());
    let mut output = vec![None; offset];
    output.extend(values);
    output
}

/// Arithmetic mean. A window of identical values yields that value exactly,
/// so flat windows have zero dispersion.
pub(crate) fn mean(values: &[f64]) -> f64 {
    match values.first() {
        Some(&first) if values.iter().all(|&v| v == first) => first,
        _ => values.iter().sum::<f64>() / values.len() as f64,
    }
}

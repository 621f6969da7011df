pub mod bias;
pub mod golden_cross;

use serde::Serialize;

use crate::trend::bias::Bias;

/// Long-horizon reading for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct TrendRecord {
    pub symbol: String,
    pub golden_cross_imminent: bool,
    pub bias: Bias,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
}

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::{close_prices, last_value};
use crate::model::Candle;
use crate::pattern::Pattern;

/// Latest close within `tolerance` above the lower band while still above the
/// middle band.
///
/// Both conditions only hold together for narrow bands. A zero-width band
/// (no dispersion, or a zero multiplier) never qualifies.
#[derive(Debug, Clone)]
pub struct BollingerBounce {
    bands: BollingerBands,
    tolerance: f64,
}

impl BollingerBounce {
    pub fn new(bands: BollingerBands, tolerance: f64) -> Result<Self, Report<IndicatorError>> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "bounce tolerance must be finite and >= 0".into(),
            });
        }
        Ok(Self { bands, tolerance })
    }
}

impl Pattern for BollingerBounce {
    fn name(&self) -> &str {
        "bollinger_bounce"
    }

    fn evaluate(&self, candles: &[Candle]) -> Option<bool> {
        let close = candles.last()?.close;
        let bands = last_value(&self.bands.calculate_bands(&close_prices(candles)))?;
        if bands.width() <= 0.0 {
            return None;
        }
        Some(close <= bands.lower * (1.0 + self.tolerance) && close > bands.middle)
    }
}

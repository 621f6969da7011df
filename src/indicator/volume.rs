use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::{Indicator, align_series, mean, volumes};
use crate::model::Candle;

/// Volume moving average: simple average of trading volume over a period.
///
/// A window containing a candle without volume is undefined.
#[derive(Debug, Clone)]
pub struct VolumeMA {
    period: usize,
}

impl VolumeMA {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }
}

impl Indicator for VolumeMA {
    fn name(&self) -> &str {
        "volume_ma"
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        let vols = volumes(candles);
        let values = vols
            .windows(self.period)
            .map(|window| {
                let window: Option<Vec<f64>> = window.iter().copied().collect();
                window.map(|w| mean(&w))
            })
            .collect();
        align_series(vols.len(), values)
    }
}

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::indicator::volume::VolumeMA;
use crate::model::Candle;
use crate::pattern::Pattern;

/// Latest volume at least `multiplier` times its trailing average (latest bar
/// included in the average).
#[derive(Debug, Clone)]
pub struct VolumeSpike {
    average: VolumeMA,
    multiplier: f64,
}

impl VolumeSpike {
    pub fn new(average: VolumeMA, multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "volume multiplier must be finite and > 0".into(),
            });
        }
        Ok(Self {
            average,
            multiplier,
        })
    }
}

impl Pattern for VolumeSpike {
    fn name(&self) -> &str {
        "volume_spike"
    }

    fn evaluate(&self, candles: &[Candle]) -> Option<bool> {
        let latest = candles.last()?.volume?;
        let average = self.average.latest(candles)?;
        if average <= 0.0 {
            return None;
        }
        Some(latest >= self.multiplier * average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::candles_from_closes;

    fn spike() -> VolumeSpike {
        VolumeSpike::new(VolumeMA::new(20).unwrap(), 1.5).unwrap()
    }

    /// 20 bars whose volumes average exactly 1000 and end with `latest`.
    fn bars_ending_with(latest: f64) -> Vec<Candle> {
        let mut vols = vec![1000.0; 18];
        vols.push(2000.0 - latest);
        vols.push(latest);
        let mut candles = candles_from_closes(&[50.0; 20]);
        for (candle, v) in candles.iter_mut().zip(vols) {
            candle.volume = Some(v);
        }
        candles
    }

    #[test]
    fn spike_at_one_point_six_times_average() {
        assert_eq!(spike().evaluate(&bars_ending_with(1600.0)), Some(true));
    }

    #[test]
    fn no_spike_at_one_point_four_times_average() {
        assert_eq!(spike().evaluate(&bars_ending_with(1400.0)), Some(false));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(spike().detect(&bars_ending_with(1500.0)));
    }

    #[test]
    fn missing_volume_is_no_signal() {
        let mut candles = bars_ending_with(1600.0);
        candles[5].volume = None;
        assert_eq!(spike().evaluate(&candles), None);

        let mut latest_missing = bars_ending_with(1600.0);
        latest_missing[19].volume = None;
        assert!(!spike().detect(&latest_missing));
    }

    #[test]
    fn zero_average_is_no_signal() {
        let mut candles = candles_from_closes(&[50.0; 20]);
        for candle in &mut candles {
            candle.volume = Some(0.0);
        }
        assert_eq!(spike().evaluate(&candles), None);
    }

    #[test]
    fn short_history_is_no_signal() {
        let candles = candles_from_closes(&[50.0; 19]);
        assert!(!spike().detect(&candles));
    }

    #[test]
    fn non_positive_multiplier_invalid() {
        assert!(VolumeSpike::new(VolumeMA::new(20).unwrap(), 0.0).is_err());
    }
}

use crate::config::TrendConfig;

use super::SampleSeries;

/// Looks a fixed number of samples ahead to tell whether the car is picking up
/// speed.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendDetector {
    lookahead_window: usize,
    acceleration_threshold: f64,
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self::from_config(&TrendConfig::default())
    }
}

impl TrendDetector {
    pub fn new(lookahead_window: usize, acceleration_threshold: f64) -> Self {
        Self {
            lookahead_window,
            acceleration_threshold,
        }
    }

    pub fn from_config(config: &TrendConfig) -> Self {
        Self::new(config.lookahead_window, config.acceleration_threshold)
    }

    pub fn lookahead_window(&self) -> usize {
        self.lookahead_window
    }

    /// True when the speed `lookahead_window` samples ahead exceeds the current
    /// speed by more than the threshold. Samples whose window runs past the end
    /// of the series are never accelerating.
    pub fn is_accelerating(&self, series: &SampleSeries, index: usize) -> bool {
        let Some(ahead) = index.checked_add(self.lookahead_window) else {
            return false;
        };
        match (series.speed_at(index), series.speed_at(ahead)) {
            (Some(now), Some(future)) => future - now > self.acceleration_threshold,
            _ => false,
        }
    }
}

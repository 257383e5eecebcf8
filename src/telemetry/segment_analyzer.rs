use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;

use super::{Sample, SampleSeries, TrendDetector};

/// Driving context of a single telemetry sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentState {
    #[serde(rename = "IN A CURVE")]
    InCurve,
    #[serde(rename = "COMING OUT THE CURVE")]
    CurveExit,
    #[serde(rename = "ON A STRAIGHT LINE (SHORT)")]
    ShortStraight,
    #[serde(rename = "ON A STRAIGHT LINE (MEDIUM-LONG)")]
    MediumLongStraight,
}

impl SegmentState {
    /// Every state, in the order the classifier tries them.
    pub const DECISION_ORDER: [SegmentState; 4] = [
        SegmentState::InCurve,
        SegmentState::CurveExit,
        SegmentState::ShortStraight,
        SegmentState::MediumLongStraight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::InCurve => "IN A CURVE",
            Self::CurveExit => "COMING OUT THE CURVE",
            Self::ShortStraight => "ON A STRAIGHT LINE (SHORT)",
            Self::MediumLongStraight => "ON A STRAIGHT LINE (MEDIUM-LONG)",
        }
    }
}

impl fmt::Display for SegmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Assigns a [`SegmentState`] to each sample with a first-match decision list:
///
/// 1. [`SegmentState::InCurve`]: braking, or low throttle at moderate speed
/// 2. [`SegmentState::CurveExit`]: partial throttle, no brake, speed building up
/// 3. [`SegmentState::ShortStraight`]: throttle just below saturation
/// 4. [`SegmentState::MediumLongStraight`]: everything else
///
/// The result depends only on the sample and the speed trend at its index.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentClassifier {
    curve_max_throttle: f64,
    curve_max_speed: f64,
    exit_max_throttle: f64,
    short_straight_max_throttle: f64,
    trend: TrendDetector,
}

impl Default for SegmentClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl SegmentClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            curve_max_throttle: config.curve_max_throttle,
            curve_max_speed: config.curve_max_speed,
            exit_max_throttle: config.exit_max_throttle,
            short_straight_max_throttle: config.short_straight_max_throttle,
            trend: TrendDetector::from_config(&config.trend),
        }
    }

    pub fn trend(&self) -> &TrendDetector {
        &self.trend
    }

    pub fn classify(&self, sample: &Sample, series: &SampleSeries, index: usize) -> SegmentState {
        SegmentState::DECISION_ORDER
            .into_iter()
            .find(|state| {
                self.rule_matches(*state, sample, || self.trend.is_accelerating(series, index))
            })
            .unwrap_or(SegmentState::MediumLongStraight)
    }

    pub fn classify_series(&self, series: &SampleSeries) -> Vec<SegmentState> {
        series
            .iter()
            .enumerate()
            .map(|(index, sample)| self.classify(sample, series, index))
            .collect()
    }

    // the trend lookahead is only evaluated when the exit rule reaches it
    fn rule_matches(
        &self,
        state: SegmentState,
        sample: &Sample,
        accelerating: impl FnOnce() -> bool,
    ) -> bool {
        match state {
            SegmentState::InCurve => {
                sample.brake
                    || (sample.throttle < self.curve_max_throttle
                        && sample.speed < self.curve_max_speed)
            }
            SegmentState::CurveExit => {
                !sample.brake && sample.throttle <= self.exit_max_throttle && accelerating()
            }
            SegmentState::ShortStraight => {
                sample.throttle > self.exit_max_throttle
                    && sample.throttle <= self.short_straight_max_throttle
            }
            SegmentState::MediumLongStraight => true,
        }
    }
}

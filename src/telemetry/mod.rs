pub mod loader;
pub mod segment_analyzer;
pub mod trend_analyzer;

use std::ops::Index;

use serde::{Deserialize, Serialize};

pub use loader::load_telemetry_csv;
pub use segment_analyzer::{SegmentClassifier, SegmentState};
pub use trend_analyzer::TrendDetector;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    /// Speed in km/h
    pub speed: f64,
    /// Position along the lap, 0 at the line and 1 at the end of the lap
    pub relative_distance: f64,
    /// Throttle use. 0=off throttle to 100=full throttle
    pub throttle: f64,
    pub brake: bool,
}

/// Lap telemetry in sample order. Built once by the loader and read-only
/// afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn speed_at(&self, index: usize) -> Option<f64> {
        self.samples.get(index).map(|s| s.speed)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl From<Vec<Sample>> for SampleSeries {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

impl FromIterator<Sample> for SampleSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Index<usize> for SampleSeries {
    type Output = Sample;

    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl<'a> IntoIterator for &'a SampleSeries {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

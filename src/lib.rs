// Library interface for lapstate
// This allows integration tests to access internal modules

pub mod config;
pub mod console;
pub mod errors;
pub mod summary;
pub mod telemetry;
pub mod writer;

// Re-export commonly used types
pub use config::AnalyzerConfig;
pub use errors::LapStateError;
pub use summary::LapSummary;
pub use telemetry::{Sample, SampleSeries, SegmentClassifier, SegmentState, TrendDetector};
pub use writer::{ReportFormat, ReportRow};

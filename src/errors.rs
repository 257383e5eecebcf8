// Error types for lapstate

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum LapStateError {
    // Errors for the telemetry loader
    #[snafu(display("ERROR! CSV FILE NOT FOUND: {path}"))]
    TelemetryInputMissing { path: String, source: io::Error },
    #[snafu(display("Error reading telemetry file {path}"))]
    TelemetryReadError { path: String, source: csv::Error },

    // Errors for the report writer
    #[snafu(display("ERROR CREATING OUTPUT FILE! {path}"))]
    ReportCreateError { path: String, source: io::Error },
    #[snafu(display("Error writing report row"))]
    ReportWriteError { source: csv::Error },
    #[snafu(display("Error writing report file"))]
    WriterError { source: io::Error },

    // Errors while reading an existing report
    #[snafu(display("Error reading report file {path}"))]
    ReportReadError { path: String, source: csv::Error },
    #[snafu(display("Error loading report file {path}"))]
    ReportLoaderError { path: String, source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Config file already exists: {path}"))]
    ConfigExists { path: String },
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
    #[snafu(display("Error parsing config file {path}"))]
    ConfigParseError {
        path: String,
        source: serde_json::Error,
    },

    // Console errors
    #[snafu(display("Error reading dataset selection"))]
    PromptError { source: io::Error },
}

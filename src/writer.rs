use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use clap::ValueEnum;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_jsonlines::JsonLinesWriter;

use crate::{
    LapStateError,
    telemetry::{Sample, SampleSeries, SegmentClassifier, SegmentState},
};

pub const REPORT_HEADER: [&str; 5] = ["RelativeDistance", "State", "Speed", "Throttle", "Brake"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ReportFormat {
    /// Comma separated, fixed precision
    #[default]
    #[serde(rename = "csv")]
    Csv,
    /// One JSON object per line
    #[serde(rename = "jsonl")]
    #[value(name = "jsonl")]
    JsonLines,
}

/// A classified sample as it appears in the report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub relative_distance: f64,
    pub state: SegmentState,
    pub speed: f64,
    pub throttle: f64,
    pub brake: bool,
}

impl ReportRow {
    pub fn new(sample: &Sample, state: SegmentState) -> Self {
        Self {
            relative_distance: sample.relative_distance,
            state,
            speed: sample.speed,
            throttle: sample.throttle,
            brake: sample.brake,
        }
    }
}

// CSV reports store the brake as 0/1
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CsvReportRecord {
    relative_distance: f64,
    state: SegmentState,
    speed: f64,
    throttle: f64,
    brake: u8,
}

impl From<CsvReportRecord> for ReportRow {
    fn from(record: CsvReportRecord) -> Self {
        Self {
            relative_distance: record.relative_distance,
            state: record.state,
            speed: record.speed,
            throttle: record.throttle,
            brake: record.brake != 0,
        }
    }
}

enum ReportSink {
    Csv(csv::Writer<File>),
    JsonLines(JsonLinesWriter<BufWriter<File>>),
}

pub struct ReportWriter {
    sink: ReportSink,
}

impl ReportWriter {
    pub fn create(path: &Path, format: ReportFormat) -> Result<Self, LapStateError> {
        let file = File::create(path).map_err(|e| LapStateError::ReportCreateError {
            path: path.display().to_string(),
            source: e,
        })?;
        let sink = match format {
            ReportFormat::Csv => {
                let mut csv_writer = csv::Writer::from_writer(file);
                csv_writer
                    .write_record(REPORT_HEADER)
                    .map_err(|e| LapStateError::ReportWriteError { source: e })?;
                ReportSink::Csv(csv_writer)
            }
            ReportFormat::JsonLines => {
                ReportSink::JsonLines(JsonLinesWriter::new(BufWriter::new(file)))
            }
        };
        Ok(Self { sink })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), LapStateError> {
        match &mut self.sink {
            ReportSink::Csv(csv_writer) => csv_writer
                .write_record([
                    format!("{:.6}", row.relative_distance),
                    row.state.label().to_string(),
                    format!("{:.2}", row.speed),
                    format!("{:.2}", row.throttle),
                    u8::from(row.brake).to_string(),
                ])
                .map_err(|e| LapStateError::ReportWriteError { source: e }),
            ReportSink::JsonLines(jsonl_writer) => jsonl_writer
                .write(row)
                .map_err(|e| LapStateError::WriterError { source: e }),
        }
    }

    pub fn finish(self) -> Result<(), LapStateError> {
        let flushed = match self.sink {
            ReportSink::Csv(mut csv_writer) => csv_writer.flush(),
            ReportSink::JsonLines(mut jsonl_writer) => jsonl_writer.flush(),
        };
        flushed.map_err(|e| LapStateError::WriterError { source: e })
    }
}

pub fn progress_line(sample: &Sample) -> String {
    format!(
        "IN POSITION: {:.4} -> SPEED: {:.4}; THROTTLE: {:.4}; BRAKE: {}",
        sample.relative_distance,
        sample.speed,
        sample.throttle,
        u8::from(sample.brake)
    )
}

/// Classifies every sample, writing one report row and one progress line per
/// sample as it goes.
pub fn export_analysis(
    series: &SampleSeries,
    classifier: &SegmentClassifier,
    report: &mut ReportWriter,
    progress: &mut impl Write,
) -> Result<Vec<ReportRow>, LapStateError> {
    let mut rows = Vec::with_capacity(series.len());
    for (index, sample) in series.iter().enumerate() {
        let row = ReportRow::new(sample, classifier.classify(sample, series, index));
        report.write_row(&row)?;
        writeln!(progress, "{}", progress_line(sample))
            .map_err(|e| LapStateError::WriterError { source: e })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Writes the report to `path`. Failures are reported on stderr and leave the
/// caller without rows; they never abort the run.
pub fn export_report(
    path: &Path,
    format: ReportFormat,
    series: &SampleSeries,
    classifier: &SegmentClassifier,
    progress: &mut impl Write,
) -> Option<Vec<ReportRow>> {
    let result = ReportWriter::create(path, format).and_then(|mut report| {
        let rows = export_analysis(series, classifier, &mut report, progress)?;
        report.finish()?;
        Ok(rows)
    });

    match result {
        Ok(rows) => {
            info!("Wrote {} report rows to {}", rows.len(), path.display());
            Some(rows)
        }
        Err(e) => {
            error!("Report not written: {}", e);
            eprintln!("{}", e);
            None
        }
    }
}

pub fn read_report(path: &Path, format: ReportFormat) -> Result<Vec<ReportRow>, LapStateError> {
    let rows = match format {
        ReportFormat::Csv => csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .and_then(|mut reader| {
                reader
                    .deserialize::<CsvReportRecord>()
                    .map(|record| record.map(ReportRow::from))
                    .collect::<Result<Vec<_>, csv::Error>>()
            })
            .map_err(|e| LapStateError::ReportReadError {
                path: path.display().to_string(),
                source: e,
            })?,
        ReportFormat::JsonLines => serde_jsonlines::json_lines(path)
            .and_then(|lines| lines.collect::<Result<Vec<ReportRow>, std::io::Error>>())
            .map_err(|e| LapStateError::ReportLoaderError {
                path: path.display().to_string(),
                source: e,
            })?,
    };
    info!("Read {} report rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ColumnLayout, telemetry::loader::read_telemetry};
    use tempfile::TempDir;

    fn lap() -> SampleSeries {
        (0..60)
            .map(|i| Sample {
                speed: 180. + i as f64 * 1.337,
                relative_distance: i as f64 / 60.,
                throttle: match i % 4 {
                    0 => 12.5,
                    1 => 64.321,
                    2 => 96.5,
                    _ => 100.,
                },
                brake: i % 7 == 0,
            })
            .collect()
    }

    #[test]
    fn test_csv_report_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis_output.csv");
        let series = SampleSeries::new(vec![
            Sample {
                speed: 212.344,
                relative_distance: 0.0123456789,
                throttle: 15.,
                brake: false,
            },
            Sample {
                speed: 300.,
                relative_distance: 0.5,
                throttle: 99.999,
                brake: true,
            },
        ]);

        let mut progress = Vec::new();
        let rows = export_report(
            &path,
            ReportFormat::Csv,
            &series,
            &SegmentClassifier::default(),
            &mut progress,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "RelativeDistance,State,Speed,Throttle,Brake\n\
             0.012346,IN A CURVE,212.34,15.00,0\n\
             0.500000,IN A CURVE,300.00,100.00,1\n"
        );

        let progress = String::from_utf8(progress).unwrap();
        assert_eq!(
            progress.lines().collect::<Vec<_>>(),
            vec![
                "IN POSITION: 0.0123 -> SPEED: 212.3440; THROTTLE: 15.0000; BRAKE: 0",
                "IN POSITION: 0.5000 -> SPEED: 300.0000; THROTTLE: 99.9990; BRAKE: 1",
            ]
        );
    }

    #[test]
    fn test_csv_round_trip_within_precision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        let series = lap();

        let written = export_report(
            &path,
            ReportFormat::Csv,
            &series,
            &SegmentClassifier::default(),
            &mut std::io::sink(),
        )
        .unwrap();
        let read = read_report(&path, ReportFormat::Csv).unwrap();

        assert_eq!(read.len(), written.len());
        for (original, parsed) in written.iter().zip(&read) {
            assert_eq!(original.state, parsed.state);
            assert_eq!(original.brake, parsed.brake);
            assert!((original.speed - parsed.speed).abs() <= 0.005 + 1e-9);
            assert!((original.throttle - parsed.throttle).abs() <= 0.005 + 1e-9);
            assert!(
                (original.relative_distance - parsed.relative_distance).abs() <= 0.0000005 + 1e-12
            );
        }
    }

    #[test]
    fn test_jsonl_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.jsonl");
        let series = lap();

        let written = export_report(
            &path,
            ReportFormat::JsonLines,
            &series,
            &SegmentClassifier::default(),
            &mut std::io::sink(),
        )
        .unwrap();

        let first_line = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .to_string();
        assert!(first_line.contains(r#""state":"IN A CURVE""#));
        let read = read_report(&path, ReportFormat::JsonLines).unwrap();
        assert_eq!(read.len(), written.len());
        for (original, parsed) in written.iter().zip(&read) {
            assert_eq!(original.state, parsed.state);
            assert_eq!(original.brake, parsed.brake);
            assert!((original.speed - parsed.speed).abs() < 1e-9);
            assert!((original.relative_distance - parsed.relative_distance).abs() < 1e-12);
        }
    }

    #[test]
    fn test_jsonl_round_trip_with_non_finite_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.jsonl");
        let telemetry = ",Date,SessionTime,Time,Speed,RPM,Throttle,Brake,nGear,DRS,Distance,RelativeDistance\n\
             0,2024-11-03,01:00:00,00:00:01,nan,11000,inf,False,7,0,100.5,0.25\n\
             1,2024-11-03,01:00:00,00:00:02,250,11000,100,False,7,0,200.5,nan\n";
        let loaded = read_telemetry(telemetry.as_bytes(), &ColumnLayout::default(), None).unwrap();
        assert_eq!(loaded.zero_fallbacks, 3);

        let written = export_report(
            &path,
            ReportFormat::JsonLines,
            &loaded.series,
            &SegmentClassifier::default(),
            &mut std::io::sink(),
        )
        .unwrap();
        assert!(!std::fs::read_to_string(&path).unwrap().contains("null"));

        let read = read_report(&path, ReportFormat::JsonLines).unwrap();
        assert_eq!(read, written);
        assert_eq!(read[0].speed, 0.);
        assert_eq!(read[0].throttle, 0.);
        assert_eq!(read[1].relative_distance, 0.);
    }

    #[test]
    fn test_uncreatable_output_degrades() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing_dir").join("analysis_output.csv");

        let mut progress = Vec::new();
        let rows = export_report(
            &path,
            ReportFormat::Csv,
            &lap(),
            &SegmentClassifier::default(),
            &mut progress,
        );
        assert!(rows.is_none());
        assert!(progress.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_read_missing_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nothing.csv");

        assert!(matches!(
            read_report(&path, ReportFormat::Csv),
            Err(LapStateError::ReportReadError { .. })
        ));
        assert!(matches!(
            read_report(&path, ReportFormat::JsonLines),
            Err(LapStateError::ReportLoaderError { .. })
        ));
    }

    #[test]
    fn test_read_report_rejects_unknown_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "RelativeDistance,State,Speed,Throttle,Brake\n0.1,ON THE GRASS,100.00,10.00,0\n",
        )
        .unwrap();

        assert!(read_report(&path, ReportFormat::Csv).is_err());
    }
}

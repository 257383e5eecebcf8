use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use log::{debug, info, warn};

use super::{Sample, SampleSeries};
use crate::{LapStateError, config::ColumnLayout};

const BRAKE_ENGAGED: &str = "True";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedTelemetry {
    pub series: SampleSeries,
    /// Numeric fields that were missing or had no numeric prefix and were read as 0
    pub zero_fallbacks: usize,
}

/// Loads a lap of telemetry from a CSV file. The first row is a header.
///
/// Fails only when the file cannot be opened or read; malformed numeric
/// fields are read as 0 and reported with a warning.
pub fn load_telemetry_csv(
    source_file: &Path,
    layout: &ColumnLayout,
    sample_limit: Option<usize>,
) -> Result<SampleSeries, LapStateError> {
    let path = source_file.display().to_string();
    let file = File::open(source_file).map_err(|e| LapStateError::TelemetryInputMissing {
        path: path.clone(),
        source: e,
    })?;

    let loaded = read_telemetry(BufReader::new(file), layout, sample_limit).map_err(|e| {
        LapStateError::TelemetryReadError {
            path: path.clone(),
            source: e,
        }
    })?;

    if loaded.zero_fallbacks > 0 {
        warn!(
            "{} numeric fields in {} could not be parsed and were read as 0",
            loaded.zero_fallbacks, path
        );
    }
    info!("Loaded {} samples from {}", loaded.series.len(), path);
    Ok(loaded.series)
}

pub fn read_telemetry<R: Read>(
    reader: R,
    layout: &ColumnLayout,
    sample_limit: Option<usize>,
) -> Result<LoadedTelemetry, csv::Error> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut samples = Vec::new();
    let mut zero_fallbacks = 0;
    for (row, record) in csv_reader.byte_records().enumerate() {
        if sample_limit.is_some_and(|limit| samples.len() >= limit) {
            break;
        }
        let record = record?;
        let fields = row_fields(&record, layout.collapse_empty_fields);
        let mut numeric = |column: usize| match fields.get(column).and_then(|f| parse_lenient(f)) {
            Some(value) => value,
            None => {
                debug!("Row {}: column {} is not numeric, using 0", row + 1, column);
                zero_fallbacks += 1;
                0.
            }
        };

        let speed = numeric(layout.speed);
        let throttle = numeric(layout.throttle);
        let relative_distance = numeric(layout.relative_distance);
        let brake = fields
            .get(layout.brake)
            .is_some_and(|f| *f == BRAKE_ENGAGED);

        samples.push(Sample {
            speed,
            relative_distance,
            throttle,
            brake,
        });
    }

    Ok(LoadedTelemetry {
        series: SampleSeries::new(samples),
        zero_fallbacks,
    })
}

fn row_fields(record: &ByteRecord, collapse_empty_fields: bool) -> Vec<Cow<'_, str>> {
    record
        .iter()
        .filter(|field| !(collapse_empty_fields && field.is_empty()))
        .map(String::from_utf8_lossy)
        .collect()
}

/// Parses the longest numeric prefix of `field`, ignoring leading whitespace.
/// `"12.5km"` reads as 12.5, `"abc"` has no value. Non-finite values such as
/// `"nan"`, `"inf"` or an overflowing `"1e999"` have no value either.
pub(crate) fn parse_lenient(field: &str) -> Option<f64> {
    let trimmed = field.trim_start();
    if let Ok(value) = trimmed.trim_end().parse::<f64>() {
        return Some(value).filter(|v| v.is_finite());
    }

    let candidate_end = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    (1..=candidate_end)
        .rev()
        .find_map(|end| trimmed[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

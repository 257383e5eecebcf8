use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{LapStateError, writer::ReportFormat};

const CONFIG_DIR_NAME: &str = "lapstate";
const CONFIG_FILE_NAME: &str = "config.json";

/// Number of samples ahead of the current one used to detect a speed trend
pub const DEFAULT_LOOKAHEAD_WINDOW: usize = 20;
/// Minimum speed gain (km/h) across the lookahead window to count as accelerating
pub const DEFAULT_ACCELERATION_THRESHOLD: f64 = 5.0;

/// Below this throttle (%) at low speed the car is considered to be cornering
pub const DEFAULT_CURVE_MAX_THROTTLE: f64 = 20.;
/// Speed (km/h) under which low throttle means cornering
pub const DEFAULT_CURVE_MAX_SPEED: f64 = 250.;
/// Highest throttle (%) that still counts as a partial application on corner exit
pub const DEFAULT_EXIT_MAX_THROTTLE: f64 = 95.;
/// Highest throttle (%) of a short straight, anything above is a medium-long one
pub const DEFAULT_SHORT_STRAIGHT_MAX_THROTTLE: f64 = 98.;

pub const DEFAULT_OUTPUT_FILE: &str = "analysis_output.csv";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    pub lookahead_window: usize,
    pub acceleration_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            lookahead_window: DEFAULT_LOOKAHEAD_WINDOW,
            acceleration_threshold: DEFAULT_ACCELERATION_THRESHOLD,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub curve_max_throttle: f64,
    pub curve_max_speed: f64,
    pub exit_max_throttle: f64,
    pub short_straight_max_throttle: f64,
    pub trend: TrendConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            curve_max_throttle: DEFAULT_CURVE_MAX_THROTTLE,
            curve_max_speed: DEFAULT_CURVE_MAX_SPEED,
            exit_max_throttle: DEFAULT_EXIT_MAX_THROTTLE,
            short_straight_max_throttle: DEFAULT_SHORT_STRAIGHT_MAX_THROTTLE,
            trend: TrendConfig::default(),
        }
    }
}

/// Zero-based positions of the columns the loader reads from each row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ColumnLayout {
    pub speed: usize,
    pub throttle: usize,
    pub brake: usize,
    pub relative_distance: usize,
    /// Drop empty fields before counting positions. The shipped datasets were
    /// produced for a tokenizer that skipped them.
    pub collapse_empty_fields: bool,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            speed: 4,
            throttle: 6,
            brake: 7,
            relative_distance: 11,
            collapse_empty_fields: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Short driver code shown in the selection prompt
    pub driver: String,
    pub path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub title: String,
    /// Selected by the prompt: 0 picks the first entry, any other number the second
    pub datasets: [DatasetConfig; 2],
    pub columns: ColumnLayout,
    pub sample_limit: Option<usize>,
    pub classifier: ClassifierConfig,
    pub output: PathBuf,
    pub report_format: ReportFormat,
    /// Relative distances splitting the lap into three sectors
    pub sector_bounds: [f64; 2],
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            title: "BRASIL (2024)".to_string(),
            datasets: [
                DatasetConfig {
                    driver: "HAM".to_string(),
                    path: PathBuf::from("telemetry_HAM_brazil_2024.csv"),
                },
                DatasetConfig {
                    driver: "VER".to_string(),
                    path: PathBuf::from("telemetry_VER_brazil_2024.csv"),
                },
            ],
            columns: ColumnLayout::default(),
            sample_limit: None,
            classifier: ClassifierConfig::default(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            report_format: ReportFormat::Csv,
            sector_bounds: [0.33, 0.67],
        }
    }
}

impl AnalyzerConfig {
    /// Location of the per-user config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    }

    /// Loads the config from `path` when given. Without an explicit path the
    /// per-user file is used if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, LapStateError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(config_path) if config_path.exists() => Self::from_file(&config_path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, LapStateError> {
        let file = File::open(path).map_err(|e| LapStateError::ConfigIOError { source: e })?;
        let config = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            LapStateError::ConfigParseError {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), LapStateError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| LapStateError::ConfigIOError { source: e })?;
        }

        let file = File::create(path).map_err(|e| LapStateError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| LapStateError::ConfigSerializeError { source: e })
    }

    /// Writes the defaults to `path`, or to the per-user location when no path
    /// is given. Refuses to overwrite an existing file unless `force` is set.
    pub fn init(path: Option<&Path>, force: bool) -> Result<PathBuf, LapStateError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path().ok_or(LapStateError::NoConfigDir)?,
        };
        if config_path.exists() && !force {
            return Err(LapStateError::ConfigExists {
                path: config_path.display().to_string(),
            });
        }
        Self::default().save(&config_path)?;
        Ok(config_path)
    }

    pub fn dataset(&self, choice: i64) -> &DatasetConfig {
        if choice != 0 {
            &self.datasets[1]
        } else {
            &self.datasets[0]
        }
    }
}

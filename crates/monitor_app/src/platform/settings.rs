//! Monitor settings, read from a RON file next to the working directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::LogDestination;
use monitor_core::DEFAULT_PROGRESS_LINES;
use monitor_engine::DEFAULT_RESULT_MAX_BYTES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "monitor_settings.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

/// Knobs for the built-in simulated calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub steps: u32,
    pub step_delay_ms: u64,
    /// Emit a warning every n-th step; 0 disables warnings.
    pub warn_every: u32,
    pub fail_at_step: Option<u32>,
    /// Act as if the user pressed Cancel after this many progress lines.
    pub cancel_after_lines: Option<usize>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            steps: 20,
            step_delay_ms: 50,
            warn_every: 0,
            fail_at_step: None,
            cancel_after_lines: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub title: String,
    pub output_path: PathBuf,
    pub generate_html: bool,
    pub max_progress_lines: usize,
    pub result_max_bytes: u64,
    pub report_dir: PathBuf,
    /// Write an issue report automatically when the job ends with warnings.
    pub auto_report: bool,
    pub log_destination: LogTarget,
    pub log_level: String,
    pub log_file: PathBuf,
    pub simulation: SimulationSettings,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            title: "Tree scan analysis".to_string(),
            output_path: PathBuf::from("output/results.txt"),
            generate_html: false,
            max_progress_lines: DEFAULT_PROGRESS_LINES,
            result_max_bytes: DEFAULT_RESULT_MAX_BYTES,
            report_dir: PathBuf::from("output/reports"),
            auto_report: false,
            log_destination: LogTarget::File,
            log_level: "info".to_string(),
            log_file: PathBuf::from("monitor.log"),
            simulation: SimulationSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Reads settings from `path`. A missing file yields the defaults; an
/// unreadable or malformed one is an error so the caller can report it once
/// logging is up.
pub fn read_settings(path: &Path) -> Result<MonitorSettings, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(MonitorSettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

//! Per-run context: timestamp, credentials and output paths.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::Credentials;

/// Timestamp format used in every file name of a run.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Output locations of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub report: PathBuf,
    pub run_log: PathBuf,
    pub session_dir: PathBuf,
}

impl RunPaths {
    /// `reports/<prefix>_<ts>.xlsx`, `logs/detailed/<ts>.log` and
    /// `logs/session/`.
    pub fn new(reports_dir: &Path, logs_dir: &Path, report_prefix: &str, timestamp: &str) -> Self {
        Self {
            report: reports_dir.join(format!("{report_prefix}_{timestamp}.xlsx")),
            run_log: logs_dir.join("detailed").join(format!("{timestamp}.log")),
            session_dir: logs_dir.join("session"),
        }
    }
}

/// Everything a run needs that is decided once at startup.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub timestamp: String,
    pub credentials: Credentials,
    pub paths: RunPaths,
}

impl RunContext {
    pub fn new(timestamp: impl Into<String>, credentials: Credentials, paths: RunPaths) -> Self {
        Self {
            timestamp: timestamp.into(),
            credentials,
            paths,
        }
    }

    /// Format a start time the way run file names expect.
    pub fn format_timestamp(time: DateTime<Local>) -> String {
        time.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Transcript path for `device`: `<session_dir>/<ts>_<device>.log`.
    pub fn session_log_path(&self, device: &str) -> PathBuf {
        let safe: String = device
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect();
        self.paths
            .session_dir
            .join(format!("{}_{safe}.log", self.timestamp))
    }
}

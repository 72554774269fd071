//! Traffic Telemetry
//!
//! Periodically appends a snapshot of the per-frame result to a durable
//! tabular log. Emission is gated by elapsed monotonic time, not by frame
//! count, so the log grows at a fixed rate regardless of frame rate.

mod cadence;
mod record;
mod recorder;
mod sink;

pub use cadence::TelemetryCadence;
pub use record::{csv_header, TelemetryRecord};
pub use recorder::{TelemetryRecorder, TickOutcome};
pub use sink::{CsvTelemetrySink, MemorySink, TelemetrySink};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Telemetry errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Existing log {path} has header '{found}', expected '{expected}'")]
    HeaderMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Record zones {found:?} do not match log columns {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Telemetry interval must be at least one second")]
    InvalidInterval,
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Write telemetry at all
    pub enabled: bool,

    /// CSV file, appended to across runs
    pub path: PathBuf,

    /// Seconds between records
    pub interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("traffic_log.csv"),
            interval_secs: 5,
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.interval_secs == 0 {
            return Err(TelemetryError::InvalidInterval);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

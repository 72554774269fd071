//! Telemetry record layout

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use signal_control::FrameResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Snapshot of one frame result at emission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Local>,

    /// `(zone id, vehicle count)` in zone declaration order
    pub zone_counts: Vec<(String, u32)>,

    pub ambulance_detected: bool,

    /// Green time per zone; `None` while the emergency override is active
    pub signal_times: Vec<(String, Option<u32>)>,
}

impl TelemetryRecord {
    pub fn from_result(timestamp: DateTime<Local>, result: &FrameResult) -> Self {
        Self {
            timestamp,
            zone_counts: result
                .zone_counts
                .iter()
                .map(|z| (z.zone_id.clone(), z.count))
                .collect(),
            ambulance_detected: result.ambulance_active,
            signal_times: result
                .zone_counts
                .iter()
                .map(|z| (z.zone_id.clone(), result.signal_time(&z.zone_id)))
                .collect(),
        }
    }

    pub fn zone_ids(&self) -> Vec<String> {
        self.zone_counts.iter().map(|(id, _)| id.clone()).collect()
    }

    /// One CSV row, without the trailing newline
    pub fn to_csv_row(&self) -> String {
        let mut cells = Vec::with_capacity(2 + self.zone_counts.len() * 2);
        cells.push(self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        cells.extend(self.zone_counts.iter().map(|(_, count)| count.to_string()));
        cells.push(self.ambulance_detected.to_string());
        cells.extend(
            self.signal_times
                .iter()
                .map(|(_, secs)| secs.map(|s| s.to_string()).unwrap_or_default()),
        );
        cells.join(",")
    }
}

/// Header line for a zone layout
pub fn csv_header(zone_ids: &[String]) -> String {
    let mut cells = Vec::with_capacity(2 + zone_ids.len() * 2);
    cells.push("timestamp".to_string());
    cells.extend(zone_ids.iter().map(|id| format!("{}_count", id)));
    cells.push("ambulance_detected".to_string());
    cells.extend(zone_ids.iter().map(|id| format!("{}_signal_time", id)));
    cells.join(",")
}

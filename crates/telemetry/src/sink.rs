//! Telemetry sinks

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::record::{csv_header, TelemetryRecord};
use crate::TelemetryError;

/// Destination for telemetry records
pub trait TelemetrySink {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError>;
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Box<S> {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        (**self).write_record(record)
    }
}

/// Append-only CSV file with a fixed zone layout
pub struct CsvTelemetrySink {
    path: PathBuf,
    file: File,
    zone_ids: Vec<String>,
    rows_written: u64,
}

impl CsvTelemetrySink {
    /// Open for appending, writing the header if the file is new or empty.
    ///
    /// An existing file must carry the same header, so rows from runs with a
    /// different zone layout never share one log.
    pub fn open(path: &Path, zone_ids: &[String]) -> Result<Self, TelemetryError> {
        let header = csv_header(zone_ids);
        let io_err = |source| TelemetryError::Io {
            path: path.display().to_string(),
            source,
        };

        let existing = match File::open(path) {
            Ok(file) => {
                let mut first = String::new();
                BufReader::new(file).read_line(&mut first).map_err(io_err)?;
                Some(first.trim_end_matches(['\r', '\n']).to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_err(e)),
        };

        if let Some(found) = existing.as_deref().filter(|h| !h.is_empty()) {
            if found != header {
                return Err(TelemetryError::HeaderMismatch {
                    path: path.display().to_string(),
                    expected: header,
                    found: found.to_string(),
                });
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;

        if existing.as_deref().map_or(true, str::is_empty) {
            writeln!(file, "{}", header).map_err(io_err)?;
            info!("Created telemetry log {}", path.display());
        } else {
            info!("Appending to telemetry log {}", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            zone_ids: zone_ids.to_vec(),
            rows_written: 0,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for CsvTelemetrySink {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        let found = record.zone_ids();
        if found != self.zone_ids {
            return Err(TelemetryError::SchemaMismatch {
                expected: self.zone_ids.clone(),
                found,
            });
        }

        // One write per row so a partial line is never interleaved
        let line = format!("{}\n", record.to_csv_row());
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|source| TelemetryError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        self.rows_written += 1;
        Ok(())
    }
}

/// Keeps records in memory (tests, dry runs)
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<TelemetryRecord>,
}

impl TelemetrySink for MemorySink {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use signal_control::{ControlConfig, FrameAnalyzer};

    fn zones() -> Vec<String> {
        vec!["lane_1".to_string()]
    }

    fn record() -> TelemetryRecord {
        let result = FrameAnalyzer::new(&ControlConfig::default())
            .unwrap()
            .analyze(&[], &[])
            .result;
        TelemetryRecord::from_result(Local::now(), &result)
    }

    #[test]
    fn test_new_file_gets_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut sink = CsvTelemetrySink::open(&path, &zones()).unwrap();
        sink.write_record(&record()).unwrap();
        sink.write_record(&record()).unwrap();
        assert_eq!(sink.rows_written(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,lane_1_count,ambulance_detected,lane_1_signal_time");
        assert!(lines[1].ends_with(",0,false,5"));
    }

    #[test]
    fn test_reopen_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        CsvTelemetrySink::open(&path, &zones())
            .unwrap()
            .write_record(&record())
            .unwrap();
        CsvTelemetrySink::open(&path, &zones())
            .unwrap()
            .write_record(&record())
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.matches("timestamp").count(), 1);
    }

    #[test]
    fn test_header_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "timestamp,old_count,ambulance_detected,old_signal_time\n").unwrap();

        let result = CsvTelemetrySink::open(&path, &zones());
        assert!(matches!(result, Err(TelemetryError::HeaderMismatch { .. })));
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "").unwrap();

        CsvTelemetrySink::open(&path, &zones()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("timestamp,lane_1_count"));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink =
            CsvTelemetrySink::open(&dir.path().join("log.csv"), &["other".to_string()]).unwrap();
        assert!(matches!(
            sink.write_record(&record()),
            Err(TelemetryError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_unwritable_path_reports_io_error() {
        let result = CsvTelemetrySink::open(Path::new("/nonexistent/dir/log.csv"), &zones());
        assert!(matches!(result, Err(TelemetryError::Io { .. })));
    }
}

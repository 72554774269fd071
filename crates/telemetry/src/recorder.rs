//! Cadence-gated telemetry recording

use std::time::Instant;

use chrono::Local;
use signal_control::FrameResult;
use tracing::{debug, warn};

use crate::cadence::TelemetryCadence;
use crate::record::TelemetryRecord;
use crate::sink::TelemetrySink;

/// What happened on a frame tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not due yet
    Skipped,
    Written,
    /// Due, but the sink failed; the record is dropped
    Failed,
}

/// Owns the cadence timer and the sink for the frame loop
pub struct TelemetryRecorder<S> {
    cadence: TelemetryCadence,
    sink: S,
    failures: u64,
}

impl<S: TelemetrySink> TelemetryRecorder<S> {
    pub fn new(cadence: TelemetryCadence, sink: S) -> Self {
        Self {
            cadence,
            sink,
            failures: 0,
        }
    }

    /// Called once per frame; write failures are logged, never propagated
    pub fn tick(&mut self, now: Instant, result: &FrameResult) -> TickOutcome {
        if !self.cadence.should_emit(now) {
            return TickOutcome::Skipped;
        }

        let record = TelemetryRecord::from_result(Local::now(), result);
        match self.sink.write_record(&record) {
            Ok(()) => {
                debug!(
                    "Telemetry written: {} vehicles, ambulance={}",
                    result.total_vehicles(),
                    result.ambulance_active
                );
                TickOutcome::Written
            }
            Err(e) => {
                self.failures += 1;
                warn!("Telemetry write failed, skipping this tick: {}", e);
                TickOutcome::Failed
            }
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn records_emitted(&self) -> u64 {
        self.cadence.emitted()
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

//! Telemetry emission cadence

use std::time::{Duration, Instant};

use tracing::debug;

/// Fires when at least `interval` has elapsed since the previous emission.
///
/// The reference point starts at construction, so the first record lands
/// one interval into the run. Emitting resets the reference to the tick
/// that fired; a long stall produces one record, not a burst.
#[derive(Debug, Clone)]
pub struct TelemetryCadence {
    interval: Duration,
    last_emission: Instant,
    emitted: u64,
}

impl TelemetryCadence {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_emission: start,
            emitted: 0,
        }
    }

    /// Check once per frame
    pub fn should_emit(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_emission);
        if elapsed < self.interval {
            return false;
        }

        debug!("Telemetry due after {:?}", elapsed);
        self.last_emission = now;
        self.emitted += 1;
        true
    }

    /// Emissions so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

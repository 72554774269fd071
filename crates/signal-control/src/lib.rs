//! Signal Control Core
//!
//! Per-frame traffic logic, recomputed from scratch on every frame:
//! - Zone classification of vehicle detections (first match wins)
//! - Green-light duration from the per-zone vehicle count
//! - Emergency vehicle override
//!
//! Nothing in this crate keeps state between frames.

pub mod analysis;
pub mod config;
pub mod emergency;
pub mod timing;
pub mod zone;

pub use analysis::{FrameAnalysis, FrameAnalyzer, FrameResult, SignalOutput, ZoneCount, ZoneSignal};
pub use config::{ControlConfig, EmergencyConfig, TimingConfig, VehicleFilter, ZoneConfig};
pub use emergency::EmergencyDecider;
pub use timing::{SignalBand, SignalTimingPolicy};
pub use zone::{Zone, ZoneAssignment, ZoneClassifier, ZoneOccupancy};

use thiserror::Error;

/// Configuration errors, reported once at startup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("At least one zone must be configured")]
    NoZones,

    #[error("Zone id '{0}' is invalid: use 1-64 characters from [A-Za-z0-9_-]")]
    InvalidZoneId(String),

    #[error("Zone id '{0}' is declared more than once")]
    DuplicateZoneId(String),

    #[error("Zone '{id}' has an empty or inverted box {bbox:?}: expected x_min < x_max and y_min < y_max")]
    InvalidZoneBox { id: String, bbox: [f32; 4] },

    #[error("{field} = {value} is outside [0, 1]")]
    ThresholdOutOfRange { field: &'static str, value: f32 },

    #[error("Accepted vehicle class set is empty")]
    EmptyClassSet,

    #[error("Emergency vehicle label is empty")]
    EmptyEmergencyLabel,

    #[error("Emergency min_area must be a non-negative number, got {0}")]
    InvalidMinArea(f32),

    #[error("Emergency max_aspect_ratio must be a positive number, got {0}")]
    InvalidAspectRatio(f32),

    #[error("Invalid signal timing: {0}")]
    InvalidTiming(String),
}

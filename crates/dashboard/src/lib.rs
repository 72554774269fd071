//! Traffic Signal Dashboard
//!
//! Wires the frame source, detectors, signal control, telemetry and overlay
//! into one synchronous loop, driven by the `traffic-dashboard` binary.

pub mod logging;
pub mod runner;
pub mod settings;

pub use logging::init_logging;
pub use runner::{build_pipeline, Pipeline, RunSummary};
pub use settings::{RuntimeSettings, Settings, SourceSettings};

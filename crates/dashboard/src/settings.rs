//! Dashboard settings
//!
//! Loaded from an optional TOML file, then overlaid with `NETRA__SECTION__KEY`
//! environment variables, then validated before anything is opened.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use detection::DetectorConfig;
use frame_source::{EndOfStream, ImageSequenceConfig};
use overlay::OverlayConfig;
use serde::{Deserialize, Serialize};
use signal_control::{ControlConfig, EmergencyConfig, TimingConfig, VehicleFilter, ZoneConfig};
use telemetry::TelemetryConfig;

const ENV_PREFIX: &str = "NETRA";

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory of still frames
    pub dir: PathBuf,
    pub fps: u32,
    pub end_of_stream: EndOfStream,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("frames"),
            fps: 30,
            end_of_stream: EndOfStream::Loop,
        }
    }
}

impl SourceSettings {
    pub fn sequence(&self) -> ImageSequenceConfig {
        ImageSequenceConfig {
            dir: self.dir.clone(),
            fps: self.fps,
        }
    }
}

/// Frame loop tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Frames taking longer than this are logged at warn
    pub slow_frame_ms: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self { slow_frame_ms: 500 }
    }
}

impl RuntimeSettings {
    pub fn slow_frame(&self) -> Duration {
        Duration::from_millis(self.slow_frame_ms)
    }
}

/// Complete dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub vehicle_detector: DetectorConfig,

    /// Second detection pass for emergency vehicles; skipped when absent
    pub ambulance_detector: Option<DetectorConfig>,

    pub vehicles: VehicleFilter,
    pub zones: Vec<ZoneConfig>,
    pub emergency: EmergencyConfig,
    pub timing: TimingConfig,
    pub telemetry: TelemetryConfig,
    pub overlay: OverlayConfig,
    pub runtime: RuntimeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let control = ControlConfig::default();
        Self {
            source: SourceSettings::default(),
            vehicle_detector: DetectorConfig::default(),
            ambulance_detector: None,
            vehicles: control.vehicles,
            zones: control.zones,
            emergency: control.emergency,
            timing: control.timing,
            telemetry: TelemetryConfig::default(),
            overlay: OverlayConfig::default(),
            runtime: RuntimeSettings::default(),
        }
    }
}

impl Settings {
    /// Load, overlay the environment, and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`Settings::load`], reading overrides from `env` instead of the
    /// process environment when it is given
    pub fn load_with_env(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match path {
                Some(p) => format!("Failed to load configuration from {}", p.display()),
                None => "Failed to load configuration from the environment".to_string(),
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Analysis configuration view
    pub fn control(&self) -> ControlConfig {
        ControlConfig {
            vehicles: self.vehicles.clone(),
            zones: self.zones.clone(),
            emergency: self.emergency.clone(),
            timing: self.timing.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.control().validate().context("Invalid signal control settings")?;
        self.telemetry.validate().context("Invalid telemetry settings")?;
        self.overlay.validate().context("Invalid overlay settings")?;
        if self.source.fps == 0 {
            anyhow::bail!("Invalid source settings: fps must be positive");
        }
        Ok(())
    }
}

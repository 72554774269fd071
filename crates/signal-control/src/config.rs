//! Signal control configuration

use std::collections::HashSet;

use detection::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const MAX_ZONE_ID_LEN: usize = 64;

/// Which vehicle detections are counted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleFilter {
    /// Class labels counted as vehicles
    pub accepted_classes: Vec<String>,

    /// Detections at or below this confidence are ignored
    pub confidence_threshold: f32,
}

impl Default for VehicleFilter {
    fn default() -> Self {
        Self {
            accepted_classes: ["car", "truck", "bus", "motorbike", "bicycle"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            confidence_threshold: 0.3,
        }
    }
}

/// A named counting zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Identifier, also used as the telemetry column prefix
    pub id: String,

    /// `[x_min, y_min, x_max, y_max]` in frame pixels
    pub bbox: BoundingBox,
}

impl ZoneConfig {
    pub fn new(id: impl Into<String>, bbox: [f32; 4]) -> Self {
        Self {
            id: id.into(),
            bbox: bbox.into(),
        }
    }
}

/// Emergency vehicle filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    /// Exact (case-sensitive) label from the ambulance model vocabulary
    pub label: String,

    /// Detections must score strictly above this
    pub confidence_threshold: f32,

    /// Box area must be strictly above this (px²)
    pub min_area: f32,

    /// When set, width / height must be strictly below this
    pub max_aspect_ratio: Option<f32>,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            label: "Ambulance".to_string(),
            confidence_threshold: 0.6,
            min_area: 3000.0,
            max_aspect_ratio: None,
        }
    }
}

/// Green-light timing policy parameters (seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Green time with no vehicles
    pub base_secs: u32,

    /// Extra green time per counted vehicle
    pub per_vehicle_secs: u32,

    /// Upper bound on green time
    pub max_secs: u32,

    /// Times above this are shown as medium waits
    pub medium_band_secs: u32,

    /// Times above this are shown as long waits
    pub long_band_secs: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_secs: 5,
            per_vehicle_secs: 2,
            max_secs: 60,
            medium_band_secs: 20,
            long_band_secs: 40,
        }
    }
}

/// Everything the per-frame analysis depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub vehicles: VehicleFilter,

    /// Counting zones, in priority order
    pub zones: Vec<ZoneConfig>,

    pub emergency: EmergencyConfig,

    pub timing: TimingConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            vehicles: VehicleFilter::default(),
            zones: vec![ZoneConfig::new("lane_1", [100.0, 100.0, 500.0, 500.0])],
            emergency: EmergencyConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl ControlConfig {
    /// Reject configurations the analysis cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_zones()?;

        if self.vehicles.accepted_classes.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::EmptyClassSet);
        }
        check_unit("vehicles.confidence_threshold", self.vehicles.confidence_threshold)?;

        let emergency = &self.emergency;
        if emergency.label.trim().is_empty() {
            return Err(ConfigError::EmptyEmergencyLabel);
        }
        check_unit("emergency.confidence_threshold", emergency.confidence_threshold)?;
        if !(emergency.min_area.is_finite() && emergency.min_area >= 0.0) {
            return Err(ConfigError::InvalidMinArea(emergency.min_area));
        }
        if let Some(ratio) = emergency.max_aspect_ratio {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(ConfigError::InvalidAspectRatio(ratio));
            }
        }

        let timing = &self.timing;
        if timing.max_secs < timing.base_secs {
            return Err(ConfigError::InvalidTiming(format!(
                "max_secs ({}) is below base_secs ({})",
                timing.max_secs, timing.base_secs
            )));
        }
        if timing.long_band_secs < timing.medium_band_secs {
            return Err(ConfigError::InvalidTiming(format!(
                "long_band_secs ({}) is below medium_band_secs ({})",
                timing.long_band_secs, timing.medium_band_secs
            )));
        }

        Ok(())
    }

    fn validate_zones(&self) -> Result<(), ConfigError> {
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }

        let mut seen = HashSet::new();
        for zone in &self.zones {
            let id_ok = !zone.id.is_empty()
                && zone.id.len() <= MAX_ZONE_ID_LEN
                && zone
                    .id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !id_ok {
                return Err(ConfigError::InvalidZoneId(zone.id.clone()));
            }
            if !seen.insert(zone.id.as_str()) {
                return Err(ConfigError::DuplicateZoneId(zone.id.clone()));
            }
            if !zone.bbox.is_well_formed() {
                return Err(ConfigError::InvalidZoneBox {
                    id: zone.id.clone(),
                    bbox: zone.bbox.into(),
                });
            }
        }
        Ok(())
    }

    /// Zone ids in declaration order
    pub fn zone_ids(&self) -> Vec<String> {
        self.zones.iter().map(|z| z.id.clone()).collect()
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { field, value })
    }
}

//! Per-frame analysis results

use detection::Detection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ControlConfig;
use crate::emergency::EmergencyDecider;
use crate::timing::{SignalBand, SignalTimingPolicy};
use crate::zone::{Zone, ZoneClassifier, ZoneOccupancy};
use crate::ConfigError;

/// Vehicle count for one zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCount {
    pub zone_id: String,
    pub count: u32,
}

/// Recommended green time for one zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSignal {
    pub zone_id: String,
    pub green_secs: u32,
    pub band: SignalBand,
}

/// Signal output for the frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SignalOutput {
    /// Emergency pre-emption: normal timing is suppressed for every zone
    Emergency,

    /// Normal timing, one entry per zone in declaration order
    Timed { zones: Vec<ZoneSignal> },
}

/// Outcome of one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Per-zone vehicle counts, in declaration order
    pub zone_counts: Vec<ZoneCount>,

    /// A qualifying emergency vehicle was seen in this frame
    pub ambulance_active: bool,

    pub signal: SignalOutput,
}

impl FrameResult {
    pub fn count(&self, zone_id: &str) -> Option<u32> {
        self.zone_counts
            .iter()
            .find(|z| z.zone_id == zone_id)
            .map(|z| z.count)
    }

    pub fn total_vehicles(&self) -> u32 {
        self.zone_counts.iter().map(|z| z.count).sum()
    }

    /// Green time for a zone; `None` under emergency override
    pub fn signal_time(&self, zone_id: &str) -> Option<u32> {
        match &self.signal {
            SignalOutput::Emergency => None,
            SignalOutput::Timed { zones } => zones
                .iter()
                .find(|z| z.zone_id == zone_id)
                .map(|z| z.green_secs),
        }
    }

    /// Zone with the longest green time
    pub fn longest_signal(&self) -> Option<&ZoneSignal> {
        match &self.signal {
            SignalOutput::Emergency => None,
            SignalOutput::Timed { zones } => zones.iter().max_by_key(|z| z.green_secs),
        }
    }
}

/// Frame result plus the detections behind it, for rendering
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub result: FrameResult,

    pub occupancy: ZoneOccupancy,

    /// Ambulance detections that triggered the override
    pub emergency_detections: Vec<Detection>,
}

/// Pure per-frame analysis over a validated configuration
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    classifier: ZoneClassifier,
    timing: SignalTimingPolicy,
    emergency: EmergencyDecider,
}

impl FrameAnalyzer {
    /// Validate the configuration and build the analyzer
    pub fn new(config: &ControlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            classifier: ZoneClassifier::new(
                config.zones.iter().map(Zone::from).collect(),
                &config.vehicles,
            ),
            timing: SignalTimingPolicy::new(&config.timing),
            emergency: EmergencyDecider::new(&config.emergency),
        })
    }

    pub fn zones(&self) -> &[Zone] {
        self.classifier.zones()
    }

    pub fn timing(&self) -> &SignalTimingPolicy {
        &self.timing
    }

    /// Analyse one frame from the two detector passes
    pub fn analyze(&self, vehicles: &[Detection], ambulances: &[Detection]) -> FrameAnalysis {
        let occupancy = self.classifier.classify(vehicles);
        let emergency_detections: Vec<Detection> = self
            .emergency
            .qualifying(ambulances)
            .into_iter()
            .cloned()
            .collect();
        let ambulance_active = !emergency_detections.is_empty();

        let zone_counts: Vec<ZoneCount> = occupancy
            .zones
            .iter()
            .map(|z| ZoneCount {
                zone_id: z.zone_id.clone(),
                count: z.count(),
            })
            .collect();

        let signal = if ambulance_active {
            SignalOutput::Emergency
        } else {
            SignalOutput::Timed {
                zones: zone_counts
                    .iter()
                    .map(|zc| {
                        let green_secs = self.timing.green_time(zc.count);
                        ZoneSignal {
                            zone_id: zc.zone_id.clone(),
                            green_secs,
                            band: self.timing.band(green_secs),
                        }
                    })
                    .collect(),
            }
        };

        debug!(
            "Frame analysed: {} vehicles in zones, {} unzoned, emergency={}",
            occupancy.total(),
            occupancy.unzoned.len(),
            ambulance_active
        );

        FrameAnalysis {
            result: FrameResult {
                zone_counts,
                ambulance_active,
                signal,
            },
            occupancy,
            emergency_detections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmergencyConfig, ZoneConfig};

    fn car(b: [f32; 4]) -> Detection {
        Detection::new("car", 0.5, b.into())
    }

    #[test]
    fn test_single_car_gives_seven_seconds() {
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        let analysis = analyzer.analyze(&[car([200.0, 200.0, 300.0, 300.0])], &[]);

        let result = &analysis.result;
        assert_eq!(result.count("lane_1"), Some(1));
        assert!(!result.ambulance_active);
        assert_eq!(result.signal_time("lane_1"), Some(7));
        assert_eq!(result.longest_signal().unwrap().band, SignalBand::Short);
    }

    #[test]
    fn test_car_outside_zone_gives_base_time() {
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        let analysis = analyzer.analyze(&[car([0.0, 0.0, 50.0, 50.0])], &[]);
        assert_eq!(analysis.result.count("lane_1"), Some(0));
        assert_eq!(analysis.result.signal_time("lane_1"), Some(5));
        assert_eq!(analysis.occupancy.unzoned.len(), 1);
    }

    #[test]
    fn test_emergency_suppresses_all_zone_timing() {
        let config = ControlConfig {
            zones: vec![
                ZoneConfig::new("lane_a", [0.0, 0.0, 640.0, 720.0]),
                ZoneConfig::new("lane_b", [640.0, 0.0, 1280.0, 720.0]),
            ],
            emergency: EmergencyConfig {
                max_aspect_ratio: Some(2.0),
                ..EmergencyConfig::default()
            },
            ..ControlConfig::default()
        };
        let analyzer = FrameAnalyzer::new(&config).unwrap();
        let ambulance = Detection::new("Ambulance", 0.8, [700.0, 100.0, 800.0, 180.0].into());

        let analysis = analyzer.analyze(&[car([100.0, 100.0, 200.0, 200.0])], &[ambulance]);
        let result = &analysis.result;

        assert!(result.ambulance_active);
        assert_eq!(result.signal, SignalOutput::Emergency);
        assert_eq!(result.signal_time("lane_a"), None);
        assert_eq!(result.signal_time("lane_b"), None);
        // counts are still reported
        assert_eq!(result.count("lane_a"), Some(1));
        assert_eq!(analysis.emergency_detections.len(), 1);
    }

    #[test]
    fn test_no_state_carries_between_frames() {
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        let ambulance = Detection::new("Ambulance", 0.9, [0.0, 0.0, 100.0, 100.0].into());

        let first = analyzer.analyze(&[car([200.0, 200.0, 300.0, 300.0])], &[ambulance]);
        let second = analyzer.analyze(&[], &[]);
        let fresh = FrameAnalyzer::new(&ControlConfig::default())
            .unwrap()
            .analyze(&[], &[]);

        assert!(first.result.ambulance_active);
        assert_eq!(second.result, fresh.result);
        assert_eq!(second.result.signal_time("lane_1"), Some(5));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ControlConfig {
            zones: Vec::new(),
            ..ControlConfig::default()
        };
        assert_eq!(FrameAnalyzer::new(&config).unwrap_err(), ConfigError::NoZones);
    }

    #[test]
    fn test_result_serializes_with_mode_tag() {
        let analyzer = FrameAnalyzer::new(&ControlConfig::default()).unwrap();
        let json = serde_json::to_value(analyzer.analyze(&[], &[]).result).unwrap();
        assert_eq!(json["signal"]["mode"], "timed");
        assert_eq!(json["signal"]["zones"][0]["green_secs"], 5);
        assert_eq!(json["zone_counts"][0]["zone_id"], "lane_1");
    }
}

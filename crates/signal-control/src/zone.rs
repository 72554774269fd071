//! Zone classification of vehicle detections

use std::collections::HashSet;

use detection::{BoundingBox, Detection};
use serde::{Deserialize, Serialize};

use crate::config::{VehicleFilter, ZoneConfig};

/// Static counting zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub bbox: BoundingBox,
}

impl From<&ZoneConfig> for Zone {
    fn from(cfg: &ZoneConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            bbox: cfg.bbox,
        }
    }
}

/// Detections counted toward one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAssignment {
    pub zone_id: String,
    pub detections: Vec<Detection>,
}

impl ZoneAssignment {
    pub fn count(&self) -> u32 {
        self.detections.len() as u32
    }
}

/// Result of classifying one frame's vehicle detections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneOccupancy {
    /// One entry per configured zone, in declaration order
    pub zones: Vec<ZoneAssignment>,

    /// Accepted vehicles whose center fell outside every zone
    pub unzoned: Vec<Detection>,
}

impl ZoneOccupancy {
    pub fn count(&self, zone_id: &str) -> Option<u32> {
        self.zones
            .iter()
            .find(|z| z.zone_id == zone_id)
            .map(ZoneAssignment::count)
    }

    /// Vehicles counted across all zones
    pub fn total(&self) -> u32 {
        self.zones.iter().map(ZoneAssignment::count).sum()
    }
}

/// Maps vehicle detections to the first zone containing their center
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    zones: Vec<Zone>,
    accepted: HashSet<String>,
    confidence_threshold: f32,
}

impl ZoneClassifier {
    pub fn new(zones: Vec<Zone>, filter: &VehicleFilter) -> Self {
        Self {
            zones,
            accepted: filter.accepted_classes.iter().cloned().collect(),
            confidence_threshold: filter.confidence_threshold,
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Class is accepted and confidence is strictly above the threshold
    pub fn accepts(&self, detection: &Detection) -> bool {
        self.accepted.contains(&detection.label) && detection.confidence > self.confidence_threshold
    }

    /// Index of the first zone (declaration order) strictly containing the center
    pub fn zone_index(&self, detection: &Detection) -> Option<usize> {
        let center = detection.bbox.center();
        self.zones.iter().position(|z| z.bbox.contains_strict(center))
    }

    /// Count vehicles per zone for one frame
    pub fn classify(&self, detections: &[Detection]) -> ZoneOccupancy {
        let mut occupancy = ZoneOccupancy {
            zones: self
                .zones
                .iter()
                .map(|z| ZoneAssignment {
                    zone_id: z.id.clone(),
                    detections: Vec::new(),
                })
                .collect(),
            unzoned: Vec::new(),
        };

        for det in detections.iter().filter(|d| self.accepts(d)) {
            match self.zone_index(det) {
                Some(idx) => occupancy.zones[idx].detections.push(det.clone()),
                None => occupancy.unzoned.push(det.clone()),
            }
        }

        occupancy
    }
}

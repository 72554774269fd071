//! Green-light duration policy

use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;

/// Coarse classification of a green time, used for dashboard colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalBand {
    Short,
    Medium,
    Long,
}

impl SignalBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalBand::Short => "short",
            SignalBand::Medium => "medium",
            SignalBand::Long => "long",
        }
    }
}

/// `green = clamp(base + per_vehicle * count, base, max)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalTimingPolicy {
    base_secs: u32,
    per_vehicle_secs: u32,
    max_secs: u32,
    medium_band_secs: u32,
    long_band_secs: u32,
}

impl SignalTimingPolicy {
    pub fn new(config: &TimingConfig) -> Self {
        Self {
            base_secs: config.base_secs,
            per_vehicle_secs: config.per_vehicle_secs,
            max_secs: config.max_secs,
            medium_band_secs: config.medium_band_secs,
            long_band_secs: config.long_band_secs,
        }
    }

    /// Recommended green time for `count` vehicles; saturates at `max_secs`
    pub fn green_time(&self, count: u32) -> u32 {
        self.base_secs
            .saturating_add(self.per_vehicle_secs.saturating_mul(count))
            .min(self.max_secs)
            .max(self.base_secs)
    }

    pub fn band(&self, secs: u32) -> SignalBand {
        if secs > self.long_band_secs {
            SignalBand::Long
        } else if secs > self.medium_band_secs {
            SignalBand::Medium
        } else {
            SignalBand::Short
        }
    }

    pub fn max_secs(&self) -> u32 {
        self.max_secs
    }
}

impl Default for SignalTimingPolicy {
    fn default() -> Self {
        Self::new(&TimingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_formula() {
        let policy = SignalTimingPolicy::default();
        assert_eq!(policy.green_time(0), 5);
        assert_eq!(policy.green_time(1), 7);
        assert_eq!(policy.green_time(10), 25);
        assert_eq!(policy.green_time(27), 59);
        assert_eq!(policy.green_time(28), 60);
        assert_eq!(policy.green_time(1000), 60);
    }

    #[test]
    fn test_saturates_without_overflow() {
        let policy = SignalTimingPolicy::new(&TimingConfig {
            base_secs: u32::MAX - 1,
            per_vehicle_secs: u32::MAX,
            max_secs: u32::MAX,
            ..TimingConfig::default()
        });
        assert_eq!(policy.green_time(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_bands() {
        let policy = SignalTimingPolicy::default();
        assert_eq!(policy.band(5), SignalBand::Short);
        assert_eq!(policy.band(20), SignalBand::Short);
        assert_eq!(policy.band(21), SignalBand::Medium);
        assert_eq!(policy.band(40), SignalBand::Medium);
        assert_eq!(policy.band(41), SignalBand::Long);
    }

    proptest! {
        #[test]
        fn prop_matches_closed_form(n in 0u32..10_000) {
            let policy = SignalTimingPolicy::default();
            prop_assert_eq!(policy.green_time(n), 60u32.min(5 + 2 * n));
        }

        #[test]
        fn prop_monotonic(
            base in 0u32..120,
            per in 0u32..30,
            extra in 0u32..600,
            n in 0u32..5_000,
        ) {
            let policy = SignalTimingPolicy::new(&TimingConfig {
                base_secs: base,
                per_vehicle_secs: per,
                max_secs: base + extra,
                ..TimingConfig::default()
            });
            let t = policy.green_time(n);
            prop_assert!(t <= policy.green_time(n + 1));
            prop_assert!(t >= base && t <= base + extra);
        }
    }
}

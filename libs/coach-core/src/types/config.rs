//! Analysis configuration and thresholds.

use serde::{Deserialize, Serialize};

/// Detection thresholds for the lap analysis pass.
///
/// The defaults work well for most road-course racing; all values can be
/// overridden from the client configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum brake pressure to enter the braking state (fraction, 0-1).
    pub brake_threshold: f64,

    /// Minimum steering magnitude to enter the cornering state (radians).
    pub steering_threshold: f64,

    /// Minimum throttle position for throttle-application detection.
    pub throttle_threshold: f64,

    /// Corners shorter than this are rejected as wheel twitches (seconds).
    pub min_corner_duration: f64,

    /// Braking zones shorter than this are rejected (seconds).
    pub min_braking_duration: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            brake_threshold: 0.05,
            steering_threshold: 0.15,
            throttle_threshold: 0.05,
            min_corner_duration: 0.30,
            min_braking_duration: 0.10,
        }
    }
}

//! Corner metrics result structure.

use serde::{Deserialize, Serialize};

/// Comprehensive corner metrics for a single corner.
///
/// Distances are normalized lap distance in [0, 1); speeds in m/s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CornerMetrics {
    /// Lap distance where steering input begins.
    pub turn_in_distance: f64,

    /// Lap distance at the apex (point of minimum speed in the corner).
    pub apex_distance: f64,

    /// Lap distance where steering unwinds.
    pub exit_distance: f64,

    /// Lap distance where throttle is reapplied after the apex.
    pub throttle_application_distance: f64,

    /// Speed at turn-in.
    pub turn_in_speed: f64,

    /// Speed at the apex (minimum corner speed).
    pub apex_speed: f64,

    /// Speed at exit.
    pub exit_speed: f64,

    /// Speed when throttle is reapplied.
    pub throttle_application_speed: f64,

    /// Peak lateral acceleration magnitude in the corner (m/s²).
    pub max_lateral_g: f64,

    /// Time spent in the corner (seconds).
    pub time_in_corner: f64,

    /// Track distance from turn-in to exit.
    pub corner_distance: f64,

    /// Peak steering magnitude used (radians).
    pub max_steering_angle: f64,

    /// Speed lost from turn-in to apex.
    pub speed_loss: f64,

    /// Speed gained from apex to exit.
    pub speed_gain: f64,
}

/// Builder for accumulating corner metrics during detection.
///
/// The apex is the minimum-speed frame; throttle application is resolved
/// at finalization because it must come after the apex, which can move
/// while the corner is still open.
#[derive(Debug)]
pub struct CornerMetricsBuilder {
    pub turn_in_idx: usize,
    pub turn_in_distance: f64,
    pub turn_in_speed: f64,
    pub turn_in_time: f64,

    pub apex_idx: usize,
    pub apex_distance: f64,
    pub apex_speed: f64,

    pub max_lateral_g: f64,
    pub max_steering: f64,
}

impl CornerMetricsBuilder {
    /// Create a new builder from the turn-in frame.
    pub fn new(
        idx: usize,
        distance: f64,
        speed: f64,
        session_time: f64,
        lateral_accel: f64,
        steering: f64,
    ) -> Self {
        Self {
            turn_in_idx: idx,
            turn_in_distance: distance,
            turn_in_speed: speed,
            turn_in_time: session_time,
            apex_idx: idx,
            apex_distance: distance,
            apex_speed: speed,
            max_lateral_g: lateral_accel.abs(),
            max_steering: steering.abs(),
        }
    }

    /// Update the running aggregates with a new frame inside the corner.
    pub fn update(
        &mut self,
        idx: usize,
        distance: f64,
        speed: f64,
        lateral_accel: f64,
        steering: f64,
    ) {
        if speed < self.apex_speed {
            self.apex_speed = speed;
            self.apex_idx = idx;
            self.apex_distance = distance;
        }
        self.max_lateral_g = self.max_lateral_g.max(lateral_accel.abs());
        self.max_steering = self.max_steering.max(steering.abs());
    }
}

//! Telemetry frame input structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A single telemetry snapshot, roughly 60 per second.
///
/// Cheap `Copy` value record; fields are grouped hot-to-cold by how often
/// the analysis pass touches them. Any frame carried through the pipeline
/// has finite numeric fields; `validate` is the gate producers use before
/// publishing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TelemetryFrame {
    // Driver inputs and vehicle state, read on every frame during detection
    pub brake: f64,
    pub throttle: f64,
    pub clutch: f64,
    pub steering_angle: f64,
    pub speed: f64,

    // Lap position, read when events open or close
    pub lap_number: i32,
    pub lap_distance_pct: f64,
    pub lap_distance: f64,
    pub session_time: f64,
    pub timestamp: DateTime<Utc>,

    // Vehicle dynamics
    pub lateral_acceleration: f64,
    pub longitudinal_acceleration: f64,
    pub vertical_acceleration: f64,
    pub yaw_rate: f64,
    pub pitch_rate: f64,
    pub roll_rate: f64,

    // World-frame velocity and orientation
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,

    // Geodetic position
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,

    // Drivetrain
    pub rpm: f64,
    pub gear: i32,

    // Per-corner tire state, [LF, RF, LR, RR] x [left, middle, right]
    pub tire_temps: [[f64; 3]; 4],
    pub tire_wear: [[f64; 3]; 4],
    // Per-wheel brake line pressure, [LF, RF, LR, RR]
    pub brake_line_pressure: [f64; 4],

    // Track and session state
    pub track_surface: i32,
    pub track_temp: f64,
    pub air_temp: f64,
    pub session_flags: u32,
    pub on_pit_road: bool,
}

impl TelemetryFrame {
    /// Check every numeric field for NaN/Inf.
    ///
    /// Returns the first offending field so producers can log what the
    /// simulator actually sent before dropping the frame.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let scalars: [(&'static str, f64); 25] = [
            ("brake", self.brake),
            ("throttle", self.throttle),
            ("clutch", self.clutch),
            ("steering_angle", self.steering_angle),
            ("speed", self.speed),
            ("lap_distance_pct", self.lap_distance_pct),
            ("lap_distance", self.lap_distance),
            ("session_time", self.session_time),
            ("lateral_acceleration", self.lateral_acceleration),
            ("longitudinal_acceleration", self.longitudinal_acceleration),
            ("vertical_acceleration", self.vertical_acceleration),
            ("yaw_rate", self.yaw_rate),
            ("pitch_rate", self.pitch_rate),
            ("roll_rate", self.roll_rate),
            ("velocity_x", self.velocity_x),
            ("velocity_y", self.velocity_y),
            ("velocity_z", self.velocity_z),
            ("yaw", self.yaw),
            ("pitch", self.pitch),
            ("roll", self.roll),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("altitude", self.altitude),
            ("rpm", self.rpm),
            ("track_temp", self.track_temp),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidFrame { field });
            }
        }
        if self.tire_temps.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidFrame { field: "tire_temps" });
        }
        if self.tire_wear.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidFrame { field: "tire_wear" });
        }
        if self.brake_line_pressure.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidFrame {
                field: "brake_line_pressure",
            });
        }
        if !self.air_temp.is_finite() {
            return Err(AnalysisError::InvalidFrame { field: "air_temp" });
        }
        Ok(())
    }
}

impl Default for TelemetryFrame {
    fn default() -> Self {
        Self {
            brake: 0.0,
            throttle: 0.0,
            clutch: 0.0,
            steering_angle: 0.0,
            speed: 0.0,
            lap_number: 0,
            lap_distance_pct: 0.0,
            lap_distance: 0.0,
            session_time: 0.0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            lateral_acceleration: 0.0,
            longitudinal_acceleration: 0.0,
            vertical_acceleration: 0.0,
            yaw_rate: 0.0,
            pitch_rate: 0.0,
            roll_rate: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            velocity_z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            rpm: 0.0,
            gear: 0,
            tire_temps: [[0.0; 3]; 4],
            tire_wear: [[0.0; 3]; 4],
            brake_line_pressure: [0.0; 4],
            track_surface: 0,
            track_temp: 0.0,
            air_temp: 0.0,
            session_flags: 0,
            on_pit_road: false,
        }
    }
}

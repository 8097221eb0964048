//! Lap metrics aggregate structure.

use serde::{Deserialize, Serialize};

use super::{BrakingMetrics, CornerMetrics};

/// Aggregate metrics for an entire lap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapMetrics {
    /// Lap number.
    pub lap_number: i32,

    /// Lap time in seconds (None if not available).
    pub lap_time: Option<f64>,

    /// All braking zones detected in the lap.
    pub braking_zones: Vec<BrakingMetrics>,

    /// All corners detected in the lap.
    pub corners: Vec<CornerMetrics>,

    /// Total number of corners.
    pub total_corners: usize,

    /// Total number of braking zones.
    pub total_braking_zones: usize,

    /// Average speed at corner apexes (m/s); 0 when no corners.
    pub average_corner_speed: f64,

    /// Maximum speed during the lap (m/s).
    pub max_speed: f64,

    /// Minimum speed during the lap (m/s).
    pub min_speed: f64,
}

impl LapMetrics {
    /// Assemble lap metrics from detected zones and corners.
    pub fn from_detection(
        lap_number: i32,
        lap_time: Option<f64>,
        braking_zones: Vec<BrakingMetrics>,
        corners: Vec<CornerMetrics>,
        max_speed: f64,
        min_speed: f64,
    ) -> Self {
        let total_braking_zones = braking_zones.len();
        let total_corners = corners.len();

        let average_corner_speed = if corners.is_empty() {
            0.0
        } else {
            corners.iter().map(|c| c.apex_speed).sum::<f64>() / corners.len() as f64
        };

        Self {
            lap_number,
            lap_time,
            braking_zones,
            corners,
            total_corners,
            total_braking_zones,
            average_corner_speed,
            max_speed,
            min_speed,
        }
    }
}

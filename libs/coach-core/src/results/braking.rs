//! Braking metrics result structure.

use serde::{Deserialize, Serialize};

/// Comprehensive braking metrics for a single braking zone.
///
/// Contains location, performance, deceleration, and trail braking data.
/// Distances are normalized lap distance in [0, 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrakingMetrics {
    /// Lap distance where braking starts.
    pub braking_point_distance: f64,

    /// Speed when braking starts (m/s).
    pub braking_point_speed: f64,

    /// Lap distance where braking ends.
    pub end_distance: f64,

    /// Maximum brake pressure applied (0-1).
    pub max_brake_pressure: f64,

    /// Duration of braking in seconds.
    pub braking_duration: f64,

    /// Minimum speed reached during braking (m/s).
    pub minimum_speed: f64,

    /// Mean deceleration over the first quarter of the zone (m/s²).
    pub initial_deceleration: f64,

    /// Average deceleration over the entire zone (m/s²).
    pub average_deceleration: f64,

    /// Average deceleration relative to the peak deceleration observed
    /// in the zone, clamped to [0, 1].
    pub braking_efficiency: f64,

    /// Whether trail braking was detected at the zone tail.
    pub has_trail_braking: bool,

    /// Track distance of the trailing span.
    pub trail_brake_distance: f64,

    /// Trailing span as a fraction of the zone distance.
    pub trail_brake_percentage: f64,
}

/// Builder for accumulating braking metrics during detection.
#[derive(Debug)]
pub struct BrakingMetricsBuilder {
    pub start_idx: usize,
    pub start_distance: f64,
    pub start_speed: f64,
    pub start_time: f64,
    pub max_pressure: f64,
    pub min_speed: f64,
}

impl BrakingMetricsBuilder {
    /// Create a new builder from the zone entry frame.
    pub fn new(idx: usize, distance: f64, speed: f64, brake: f64, session_time: f64) -> Self {
        Self {
            start_idx: idx,
            start_distance: distance,
            start_speed: speed,
            start_time: session_time,
            max_pressure: brake,
            min_speed: speed,
        }
    }

    /// Update the running aggregates with a new frame inside the zone.
    pub fn update(&mut self, brake: f64, speed: f64) {
        self.max_pressure = self.max_pressure.max(brake);
        self.min_speed = self.min_speed.min(speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_tracks_extremes() {
        let mut builder = BrakingMetricsBuilder::new(10, 0.5, 80.0, 0.3, 100.0);
        builder.update(0.9, 70.0);
        builder.update(0.8, 50.0);

        assert_eq!(builder.max_pressure, 0.9);
        assert_eq!(builder.min_speed, 50.0);
        assert_eq!(builder.start_speed, 80.0);
    }
}

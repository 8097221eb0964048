//! Braking zone detection.

use crate::analysis::{detect_trail_braking, initial_deceleration, peak_deceleration};
use crate::results::{BrakingMetrics, BrakingMetricsBuilder};
use crate::types::{AnalysisConfig, TelemetryFrame};

use super::EventDetector;

/// State for braking zone detection.
#[derive(Debug, Clone, Copy, PartialEq)]
enum BrakingState {
    /// Brake below threshold.
    Cruising,
    /// In a braking zone.
    Braking,
}

/// Detector for braking zones using a state machine approach.
///
/// Tracks when brake pressure crosses the threshold and accumulates
/// metrics until the braking zone ends.
pub struct BrakingDetector<'a> {
    config: &'a AnalysisConfig,
    state: BrakingState,
    builder: Option<BrakingMetricsBuilder>,
}

impl<'a> BrakingDetector<'a> {
    /// Create a new braking detector with the given configuration.
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            config,
            state: BrakingState::Cruising,
            builder: None,
        }
    }

    /// Finalize a builder into BrakingMetrics using the full frame slice.
    ///
    /// `end_idx` is the frame that closed the zone: the release frame (the
    /// first one back under the brake threshold), or the final frame when
    /// the lap ends mid-zone. Duration, end distance, and minimum speed
    /// all read from it.
    ///
    /// Returns `None` when the zone is shorter than the configured minimum
    /// duration.
    pub fn finalize_builder(
        &self,
        builder: BrakingMetricsBuilder,
        frames: &[TelemetryFrame],
        end_idx: usize,
    ) -> Option<BrakingMetrics> {
        let end_idx = end_idx.min(frames.len() - 1);
        let end_frame = &frames[end_idx];

        let duration = end_frame.session_time - builder.start_time;
        if duration < self.config.min_braking_duration {
            return None;
        }

        let minimum_speed = builder.min_speed.min(end_frame.speed);
        let initial_decel = initial_deceleration(frames, builder.start_idx, end_idx);
        let average_decel = (builder.start_speed - minimum_speed) / duration;

        let peak_decel = peak_deceleration(frames, builder.start_idx, end_idx);
        let efficiency = if peak_decel > 0.0 {
            (average_decel / peak_decel).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let trail = detect_trail_braking(frames, builder.start_idx, end_idx, self.config);

        Some(BrakingMetrics {
            braking_point_distance: builder.start_distance,
            braking_point_speed: builder.start_speed,
            end_distance: end_frame.lap_distance_pct,
            max_brake_pressure: builder.max_pressure,
            braking_duration: duration,
            minimum_speed,
            initial_deceleration: initial_decel,
            average_deceleration: average_decel,
            braking_efficiency: efficiency,
            has_trail_braking: trail.has_trail_braking,
            trail_brake_distance: trail.distance,
            trail_brake_percentage: trail.percentage,
        })
    }
}

impl EventDetector for BrakingDetector<'_> {
    type Builder = BrakingMetricsBuilder;

    fn process_frame(&mut self, frame: &TelemetryFrame, index: usize) -> Option<Self::Builder> {
        let is_braking = frame.brake > self.config.brake_threshold;

        match self.state {
            BrakingState::Cruising => {
                if is_braking {
                    self.state = BrakingState::Braking;
                    self.builder = Some(BrakingMetricsBuilder::new(
                        index,
                        frame.lap_distance_pct,
                        frame.speed,
                        frame.brake,
                        frame.session_time,
                    ));
                }
                None
            }
            BrakingState::Braking => {
                if is_braking {
                    if let Some(ref mut builder) = self.builder {
                        builder.update(frame.brake, frame.speed);
                    }
                    None
                } else {
                    self.state = BrakingState::Cruising;
                    self.builder.take()
                }
            }
        }
    }

    fn finalize(&mut self) -> Option<Self::Builder> {
        self.state = BrakingState::Cruising;
        self.builder.take()
    }

    fn reset(&mut self) {
        self.state = BrakingState::Cruising;
        self.builder = None;
    }
}

//! Corner detection.

use crate::results::{CornerMetrics, CornerMetricsBuilder};
use crate::types::{AnalysisConfig, TelemetryFrame};
use crate::utils::wrap_distance;

use super::EventDetector;

/// Consecutive frames of throttle required to count as reapplication.
const THROTTLE_SUSTAIN_FRAMES: usize = 3;

/// State for corner detection.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CornerState {
    /// Steering magnitude below threshold.
    Straight,
    /// In a corner.
    Cornering,
}

/// Detector for corners using a state machine approach.
///
/// Tracks when steering magnitude crosses the threshold and accumulates
/// the apex (minimum speed), peak lateral acceleration, and peak steering.
pub struct CornerDetector<'a> {
    config: &'a AnalysisConfig,
    state: CornerState,
    builder: Option<CornerMetricsBuilder>,
}

impl<'a> CornerDetector<'a> {
    /// Create a new corner detector with the given configuration.
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            config,
            state: CornerState::Straight,
            builder: None,
        }
    }

    /// Finalize a builder into CornerMetrics using the full frame slice.
    ///
    /// Returns `None` when the corner is shorter than the configured
    /// minimum duration.
    pub fn finalize_builder(
        &self,
        builder: CornerMetricsBuilder,
        frames: &[TelemetryFrame],
        end_idx: usize,
    ) -> Option<CornerMetrics> {
        let end_idx = end_idx.min(frames.len() - 1);
        let exit_frame = &frames[end_idx];

        let time_in_corner = exit_frame.session_time - builder.turn_in_time;
        if time_in_corner < self.config.min_corner_duration {
            return None;
        }

        let corner_distance =
            wrap_distance(exit_frame.lap_distance_pct - builder.turn_in_distance);

        // Throttle reapplication: first frame after the apex holding the
        // throttle above threshold for enough consecutive frames. Falls
        // back to the exit frame when never satisfied.
        let throttle_idx =
            find_throttle_application(frames, builder.apex_idx, end_idx, self.config)
                .unwrap_or(end_idx);
        let throttle_frame = &frames[throttle_idx];

        let speed_loss = builder.turn_in_speed - builder.apex_speed;
        let speed_gain = exit_frame.speed - builder.apex_speed;

        Some(CornerMetrics {
            turn_in_distance: builder.turn_in_distance,
            apex_distance: builder.apex_distance,
            exit_distance: exit_frame.lap_distance_pct,
            throttle_application_distance: throttle_frame.lap_distance_pct,
            turn_in_speed: builder.turn_in_speed,
            apex_speed: builder.apex_speed,
            exit_speed: exit_frame.speed,
            throttle_application_speed: throttle_frame.speed,
            max_lateral_g: builder.max_lateral_g,
            time_in_corner,
            corner_distance,
            max_steering_angle: builder.max_steering,
            speed_loss,
            speed_gain,
        })
    }
}

/// Find the first frame after the apex where throttle stays above the
/// threshold for at least `THROTTLE_SUSTAIN_FRAMES` consecutive frames.
fn find_throttle_application(
    frames: &[TelemetryFrame],
    apex_idx: usize,
    end_idx: usize,
    config: &AnalysisConfig,
) -> Option<usize> {
    let mut run_start = None;
    let mut run_len = 0usize;

    for idx in (apex_idx + 1)..=end_idx {
        if frames[idx].throttle > config.throttle_threshold {
            if run_len == 0 {
                run_start = Some(idx);
            }
            run_len += 1;
            if run_len >= THROTTLE_SUSTAIN_FRAMES {
                return run_start;
            }
        } else {
            run_start = None;
            run_len = 0;
        }
    }

    None
}

impl EventDetector for CornerDetector<'_> {
    type Builder = CornerMetricsBuilder;

    fn process_frame(&mut self, frame: &TelemetryFrame, index: usize) -> Option<Self::Builder> {
        let is_turning = frame.steering_angle.abs() > self.config.steering_threshold;

        match self.state {
            CornerState::Straight => {
                if is_turning {
                    self.state = CornerState::Cornering;
                    self.builder = Some(CornerMetricsBuilder::new(
                        index,
                        frame.lap_distance_pct,
                        frame.speed,
                        frame.session_time,
                        frame.lateral_acceleration,
                        frame.steering_angle,
                    ));
                }
                None
            }
            CornerState::Cornering => {
                if is_turning {
                    if let Some(ref mut builder) = self.builder {
                        builder.update(
                            index,
                            frame.lap_distance_pct,
                            frame.speed,
                            frame.lateral_acceleration,
                            frame.steering_angle,
                        );
                    }
                    None
                } else {
                    self.state = CornerState::Straight;
                    self.builder.take()
                }
            }
        }
    }

    fn finalize(&mut self) -> Option<Self::Builder> {
        self.state = CornerState::Straight;
        self.builder.take()
    }

    fn reset(&mut self) {
        self.state = CornerState::Straight;
        self.builder = None;
    }
}

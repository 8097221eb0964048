//! Deceleration measures over a braking zone.

use crate::types::TelemetryFrame;

/// Mean deceleration over the first quarter of a zone, by time.
///
/// Averages the negated longitudinal acceleration of every frame whose
/// session time falls within the first quarter of the zone's duration.
/// Positive values mean the car is slowing.
///
/// Returns 0.0 for invalid index ranges.
pub fn initial_deceleration(frames: &[TelemetryFrame], start_idx: usize, end_idx: usize) -> f64 {
    if start_idx > end_idx || end_idx >= frames.len() {
        return 0.0;
    }

    let start_time = frames[start_idx].session_time;
    let duration = frames[end_idx].session_time - start_time;
    let cutoff = start_time + duration * 0.25;

    let mut sum = 0.0;
    let mut count = 0usize;
    for frame in &frames[start_idx..=end_idx] {
        if frame.session_time > cutoff {
            break;
        }
        sum += -frame.longitudinal_acceleration;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Largest instantaneous deceleration observed inside a zone.
///
/// The maximum of the negated longitudinal acceleration; 0.0 when the car
/// never decelerated (or the range is invalid).
pub fn peak_deceleration(frames: &[TelemetryFrame], start_idx: usize, end_idx: usize) -> f64 {
    if start_idx > end_idx || end_idx >= frames.len() {
        return 0.0;
    }

    frames[start_idx..=end_idx]
        .iter()
        .map(|f| -f.longitudinal_acceleration)
        .fold(0.0, f64::max)
}

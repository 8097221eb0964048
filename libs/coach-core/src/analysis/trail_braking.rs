//! Trail braking detection within a braking zone.

use crate::types::{AnalysisConfig, TelemetryFrame};
use crate::utils::wrap_distance;

/// Share of the zone that must be covered trailing for the flag to be set.
const TRAIL_BRAKE_MIN_SHARE: f64 = 0.10;

/// Trail braking measured over one braking zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailBrakingInfo {
    /// Whether the trailing share of the zone exceeds the minimum.
    pub has_trail_braking: bool,
    /// Track distance (normalized) of the trailing span at the zone tail.
    pub distance: f64,
    /// Trailing distance as a fraction of the whole zone distance.
    pub percentage: f64,
}

/// Analyze the tail of a braking zone for trail braking.
///
/// A frame is "trailing" when the driver is both braking and steering past
/// the respective thresholds. The measured span is the latest contiguous
/// run of trailing frames reaching the zone's end; a driver who
/// straightens up before releasing the brake gets no credit.
///
/// `end_idx` is the frame that closed the zone: the release frame (brakes
/// already off, never itself trailing) or the final in-zone frame when the
/// lap ended mid-zone. Distances are measured up to that frame.
pub fn detect_trail_braking(
    frames: &[TelemetryFrame],
    start_idx: usize,
    end_idx: usize,
    config: &AnalysisConfig,
) -> TrailBrakingInfo {
    if frames.is_empty() || start_idx > end_idx || end_idx >= frames.len() {
        return TrailBrakingInfo::default();
    }

    let is_trailing = |frame: &TelemetryFrame| {
        frame.brake > config.brake_threshold
            && frame.steering_angle.abs() > config.steering_threshold
    };

    // The release frame is off the brakes; the tail run ends on the last
    // in-zone frame before it.
    let last_in_zone = if frames[end_idx].brake > config.brake_threshold {
        end_idx
    } else if end_idx > start_idx {
        end_idx - 1
    } else {
        return TrailBrakingInfo::default();
    };

    // Walk backwards to find the start of the tail span.
    let mut span_start = None;
    for idx in (start_idx..=last_in_zone).rev() {
        if is_trailing(&frames[idx]) {
            span_start = Some(idx);
        } else {
            break;
        }
    }

    let Some(span_start) = span_start else {
        return TrailBrakingInfo::default();
    };

    let distance = wrap_distance(
        frames[end_idx].lap_distance_pct - frames[span_start].lap_distance_pct,
    );
    let zone_distance = wrap_distance(
        frames[end_idx].lap_distance_pct - frames[start_idx].lap_distance_pct,
    );
    let percentage = if zone_distance > 0.0 {
        distance / zone_distance
    } else {
        0.0
    };

    TrailBrakingInfo {
        has_trail_braking: percentage > TRAIL_BRAKE_MIN_SHARE,
        distance,
        percentage,
    }
}

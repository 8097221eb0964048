//! Unified single-pass lap analysis.

use crate::analysis::SpeedStatistics;
use crate::detection::{BrakingDetector, CornerDetector, EventDetector};
use crate::error::AnalysisError;
use crate::results::{BrakingMetrics, BrakingMetricsBuilder, CornerMetrics, CornerMetricsBuilder, LapMetrics};
use crate::types::{AnalysisConfig, LapTelemetry, TelemetryFrame};

/// Analyze a completed lap.
///
/// Pure and deterministic: the same sequence and configuration always
/// produce the same output. The lap number is taken from the first frame.
///
/// # Errors
/// - `InsufficientData` when the lap has fewer than two frames.
/// - `InvalidFrame` when any frame carries a non-finite field.
pub fn analyze_lap(lap: &LapTelemetry, config: &AnalysisConfig) -> Result<LapMetrics, AnalysisError> {
    if lap.frames.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            frames: lap.frames.len(),
        });
    }
    for frame in &lap.frames {
        frame.validate()?;
    }

    let lap_number = lap.lap_number().unwrap_or(0);
    Ok(extract_lap_metrics(
        &lap.frames,
        config,
        lap_number,
        lap.lap_time,
    ))
}

/// Extract comprehensive lap metrics in a single pass over the frames.
///
/// Both detection state machines and the speed accumulator advance on every
/// frame, so the whole analysis is O(n) with one iteration over the data.
/// Inputs are assumed validated; `analyze_lap` is the checked entry point.
pub fn extract_lap_metrics(
    frames: &[TelemetryFrame],
    config: &AnalysisConfig,
    lap_number: i32,
    lap_time: Option<f64>,
) -> LapMetrics {
    if frames.is_empty() {
        return LapMetrics::from_detection(lap_number, lap_time, vec![], vec![], 0.0, 0.0);
    }

    let mut braking_detector = BrakingDetector::new(config);
    let mut corner_detector = CornerDetector::new(config);
    let mut speed_stats = SpeedStatistics::new();

    let mut pending_braking: Vec<(BrakingMetricsBuilder, usize)> = Vec::with_capacity(20);
    let mut pending_corners: Vec<(CornerMetricsBuilder, usize)> = Vec::with_capacity(25);

    for (idx, frame) in frames.iter().enumerate() {
        speed_stats.update(frame.speed);

        if let Some(builder) = braking_detector.process_frame(frame, idx) {
            // The zone closes on this frame, the one with the brakes released.
            pending_braking.push((builder, idx));
        }
        if let Some(builder) = corner_detector.process_frame(frame, idx) {
            // The corner's exit is the previous frame, the last one steered.
            pending_corners.push((builder, idx.saturating_sub(1)));
        }
    }

    // Close any events still open at the end of the lap.
    if let Some(builder) = braking_detector.finalize() {
        pending_braking.push((builder, frames.len() - 1));
    }
    if let Some(builder) = corner_detector.finalize() {
        pending_corners.push((builder, frames.len() - 1));
    }

    let braking_zones: Vec<BrakingMetrics> = pending_braking
        .into_iter()
        .filter_map(|(builder, end_idx)| {
            braking_detector.finalize_builder(builder, frames, end_idx)
        })
        .collect();

    let corners: Vec<CornerMetrics> = pending_corners
        .into_iter()
        .filter_map(|(builder, end_idx)| {
            corner_detector.finalize_builder(builder, frames, end_idx)
        })
        .collect();

    LapMetrics::from_detection(
        lap_number,
        lap_time,
        braking_zones,
        corners,
        speed_stats.max(),
        speed_stats.min(),
    )
}

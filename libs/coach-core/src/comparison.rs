//! Lap-to-lap comparison with distance-matched zones and corners.

use serde::{Deserialize, Serialize};

use crate::results::LapMetrics;
use crate::utils::circular_delta;

/// Maximum normalized distance between matched zones or corners.
pub const DISTANCE_MATCH_THRESHOLD: f64 = 0.10;

/// Trail braking usage across the two laps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailBrakingComparison {
    Both,
    BaselineOnly,
    ComparisonOnly,
    Neither,
}

impl TrailBrakingComparison {
    fn from_flags(baseline: bool, comparison: bool) -> Self {
        match (baseline, comparison) {
            (true, true) => TrailBrakingComparison::Both,
            (true, false) => TrailBrakingComparison::BaselineOnly,
            (false, true) => TrailBrakingComparison::ComparisonOnly,
            (false, false) => TrailBrakingComparison::Neither,
        }
    }
}

/// Deltas for one baseline braking zone.
///
/// All deltas follow `comparison - baseline`; `None` when the zone has no
/// match in the comparison lap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrakingZoneComparison {
    pub zone_index: usize,
    pub matched_zone_index: Option<usize>,
    pub baseline_distance: f64,
    pub comparison_distance: Option<f64>,
    pub distance_delta: Option<f64>,
    pub braking_point_speed_delta: Option<f64>,
    pub max_brake_pressure_delta: Option<f64>,
    pub braking_duration_delta: Option<f64>,
    pub minimum_speed_delta: Option<f64>,
    pub braking_efficiency_delta: Option<f64>,
    pub trail_braking_comparison: Option<TrailBrakingComparison>,
}

/// Deltas for one baseline corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CornerComparison {
    pub corner_index: usize,
    pub matched_corner_index: Option<usize>,
    pub baseline_apex_distance: f64,
    pub comparison_apex_distance: Option<f64>,
    pub distance_delta: Option<f64>,
    pub turn_in_speed_delta: Option<f64>,
    pub apex_speed_delta: Option<f64>,
    pub exit_speed_delta: Option<f64>,
    pub max_lateral_g_delta: Option<f64>,
    pub time_in_corner_delta: Option<f64>,
    pub corner_distance_delta: Option<f64>,
}

/// Overall comparison statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapComparisonSummary {
    pub baseline_lap_number: i32,
    pub comparison_lap_number: i32,
    pub baseline_lap_time: Option<f64>,
    pub comparison_lap_time: Option<f64>,
    /// Negative means the comparison lap is faster.
    pub lap_time_delta: Option<f64>,
    pub max_speed_delta: f64,
    pub min_speed_delta: f64,
    pub average_corner_speed_delta: f64,
    pub total_braking_zones_baseline: usize,
    pub total_braking_zones_comparison: usize,
    pub total_corners_baseline: usize,
    pub total_corners_comparison: usize,
    pub matched_braking_zones: usize,
    pub matched_corners: usize,
}

/// Full result of comparing two laps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapComparison {
    pub summary: LapComparisonSummary,
    pub braking_zone_comparisons: Vec<BrakingZoneComparison>,
    pub corner_comparisons: Vec<CornerComparison>,
}

/// Compare two laps and compute per-zone and per-corner performance deltas.
///
/// Matching is greedy per baseline entity: the nearest unmatched comparison
/// entity by wrap-normalized distance wins, provided the gap is below
/// `DISTANCE_MATCH_THRESHOLD`. Unmatched baseline entities are reported
/// with empty deltas; extra comparison entities only show up in the counts.
pub fn compare_laps(baseline: &LapMetrics, comparison: &LapMetrics) -> LapComparison {
    let braking_zone_comparisons = compare_braking_zones(baseline, comparison);
    let corner_comparisons = compare_corners(baseline, comparison);

    let matched_braking_zones = braking_zone_comparisons
        .iter()
        .filter(|c| c.matched_zone_index.is_some())
        .count();
    let matched_corners = corner_comparisons
        .iter()
        .filter(|c| c.matched_corner_index.is_some())
        .count();

    let lap_time_delta = match (baseline.lap_time, comparison.lap_time) {
        (Some(base), Some(comp)) => Some(comp - base),
        _ => None,
    };

    let summary = LapComparisonSummary {
        baseline_lap_number: baseline.lap_number,
        comparison_lap_number: comparison.lap_number,
        baseline_lap_time: baseline.lap_time,
        comparison_lap_time: comparison.lap_time,
        lap_time_delta,
        max_speed_delta: comparison.max_speed - baseline.max_speed,
        min_speed_delta: comparison.min_speed - baseline.min_speed,
        average_corner_speed_delta: comparison.average_corner_speed
            - baseline.average_corner_speed,
        total_braking_zones_baseline: baseline.total_braking_zones,
        total_braking_zones_comparison: comparison.total_braking_zones,
        total_corners_baseline: baseline.total_corners,
        total_corners_comparison: comparison.total_corners,
        matched_braking_zones,
        matched_corners,
    };

    LapComparison {
        summary,
        braking_zone_comparisons,
        corner_comparisons,
    }
}

/// Greedy nearest-neighbour match over key distances.
///
/// Returns, per baseline index, the matched comparison index. A strict
/// improvement scan breaks ties toward the lower comparison index.
fn match_by_distance(baseline_keys: &[f64], comparison_keys: &[f64]) -> Vec<Option<usize>> {
    let mut taken = vec![false; comparison_keys.len()];
    baseline_keys
        .iter()
        .map(|&key| {
            let mut best: Option<(usize, f64)> = None;
            for (idx, &candidate) in comparison_keys.iter().enumerate() {
                if taken[idx] {
                    continue;
                }
                let gap = circular_delta(key, candidate);
                if gap >= DISTANCE_MATCH_THRESHOLD {
                    continue;
                }
                if best.map_or(true, |(_, best_gap)| gap < best_gap) {
                    best = Some((idx, gap));
                }
            }
            best.map(|(idx, _)| {
                taken[idx] = true;
                idx
            })
        })
        .collect()
}

fn compare_braking_zones(
    baseline: &LapMetrics,
    comparison: &LapMetrics,
) -> Vec<BrakingZoneComparison> {
    let baseline_keys: Vec<f64> = baseline
        .braking_zones
        .iter()
        .map(|z| z.braking_point_distance)
        .collect();
    let comparison_keys: Vec<f64> = comparison
        .braking_zones
        .iter()
        .map(|z| z.braking_point_distance)
        .collect();
    let matches = match_by_distance(&baseline_keys, &comparison_keys);

    baseline
        .braking_zones
        .iter()
        .enumerate()
        .map(|(zone_index, base)| match matches[zone_index] {
            Some(comp_idx) => {
                let comp = &comparison.braking_zones[comp_idx];
                BrakingZoneComparison {
                    zone_index,
                    matched_zone_index: Some(comp_idx),
                    baseline_distance: base.braking_point_distance,
                    comparison_distance: Some(comp.braking_point_distance),
                    distance_delta: Some(comp.braking_point_distance - base.braking_point_distance),
                    braking_point_speed_delta: Some(
                        comp.braking_point_speed - base.braking_point_speed,
                    ),
                    max_brake_pressure_delta: Some(
                        comp.max_brake_pressure - base.max_brake_pressure,
                    ),
                    braking_duration_delta: Some(comp.braking_duration - base.braking_duration),
                    minimum_speed_delta: Some(comp.minimum_speed - base.minimum_speed),
                    braking_efficiency_delta: Some(
                        comp.braking_efficiency - base.braking_efficiency,
                    ),
                    trail_braking_comparison: Some(TrailBrakingComparison::from_flags(
                        base.has_trail_braking,
                        comp.has_trail_braking,
                    )),
                }
            }
            None => BrakingZoneComparison {
                zone_index,
                matched_zone_index: None,
                baseline_distance: base.braking_point_distance,
                comparison_distance: None,
                distance_delta: None,
                braking_point_speed_delta: None,
                max_brake_pressure_delta: None,
                braking_duration_delta: None,
                minimum_speed_delta: None,
                braking_efficiency_delta: None,
                trail_braking_comparison: None,
            },
        })
        .collect()
}

fn compare_corners(baseline: &LapMetrics, comparison: &LapMetrics) -> Vec<CornerComparison> {
    let baseline_keys: Vec<f64> = baseline.corners.iter().map(|c| c.apex_distance).collect();
    let comparison_keys: Vec<f64> = comparison.corners.iter().map(|c| c.apex_distance).collect();
    let matches = match_by_distance(&baseline_keys, &comparison_keys);

    baseline
        .corners
        .iter()
        .enumerate()
        .map(|(corner_index, base)| match matches[corner_index] {
            Some(comp_idx) => {
                let comp = &comparison.corners[comp_idx];
                CornerComparison {
                    corner_index,
                    matched_corner_index: Some(comp_idx),
                    baseline_apex_distance: base.apex_distance,
                    comparison_apex_distance: Some(comp.apex_distance),
                    distance_delta: Some(comp.apex_distance - base.apex_distance),
                    turn_in_speed_delta: Some(comp.turn_in_speed - base.turn_in_speed),
                    apex_speed_delta: Some(comp.apex_speed - base.apex_speed),
                    exit_speed_delta: Some(comp.exit_speed - base.exit_speed),
                    max_lateral_g_delta: Some(comp.max_lateral_g - base.max_lateral_g),
                    time_in_corner_delta: Some(comp.time_in_corner - base.time_in_corner),
                    corner_distance_delta: Some(comp.corner_distance - base.corner_distance),
                }
            }
            None => CornerComparison {
                corner_index,
                matched_corner_index: None,
                baseline_apex_distance: base.apex_distance,
                comparison_apex_distance: None,
                distance_delta: None,
                turn_in_speed_delta: None,
                apex_speed_delta: None,
                exit_speed_delta: None,
                max_lateral_g_delta: None,
                time_in_corner_delta: None,
                corner_distance_delta: None,
            },
        })
        .collect()
}

//! Gridded track boundary model and lateral-position solver.
//!
//! A boundary is built from two demarcation laps, one hugging each track
//! edge, resampled onto a uniform grid over normalized lap distance. Any
//! (lap distance, latitude, longitude) query then resolves to a signed
//! lateral position: -1 at the left edge, +1 at the right, 0 on the
//! centerline, beyond ±1 off track.

mod codec;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::{LapTelemetry, TelemetryFrame};

/// Minimum share of [0, 1] a demarcation lap must cover.
const MIN_COVERAGE: f64 = 0.95;

/// Lateral magnitude beyond which a query is flagged as an off-track
/// candidate (5 track widths from the centerline; one width spans 2).
const OFF_TRACK_LATERAL_LIMIT: f64 = 10.0;

/// Gridded left/right track boundary for one (track, config) pair.
///
/// All five arrays have length `grid_size`; `grid_distance_pct` starts at
/// 0 and is strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackBoundary {
    pub track_id: i32,
    pub track_config_name: Option<String>,
    pub grid_size: usize,
    pub grid_distance_pct: Vec<f64>,
    pub left_latitude: Vec<f64>,
    pub left_longitude: Vec<f64>,
    pub right_latitude: Vec<f64>,
    pub right_longitude: Vec<f64>,
    /// Frame counts of the source laps, kept for provenance.
    pub source_left_frames: usize,
    pub source_right_frames: usize,
    /// Total track length in meters, when known.
    pub track_length: Option<f64>,
}

/// A telemetry frame augmented with its lateral track position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AugmentedTelemetryFrame {
    pub frame: TelemetryFrame,
    /// Signed offset: -1 left edge, +1 right edge, unclamped outside.
    pub lateral_position: f64,
    /// Set when the query projects implausibly far from the track.
    pub off_track_candidate: bool,
}

/// A lap with lateral positions for every frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentedLapTelemetry {
    pub frames: Vec<AugmentedTelemetryFrame>,
    pub lap_time: Option<f64>,
}

impl TrackBoundary {
    /// Check the structural invariants of the grid.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.grid_size == 0 {
            return Err(AnalysisError::MalformedBoundary("empty grid".into()));
        }
        let arrays = [
            self.grid_distance_pct.len(),
            self.left_latitude.len(),
            self.left_longitude.len(),
            self.right_latitude.len(),
            self.right_longitude.len(),
        ];
        if arrays.iter().any(|&len| len != self.grid_size) {
            return Err(AnalysisError::MalformedBoundary(format!(
                "array lengths {:?} do not match grid size {}",
                arrays, self.grid_size
            )));
        }
        if self.grid_distance_pct[0] != 0.0 {
            return Err(AnalysisError::MalformedBoundary(
                "grid does not start at 0".into(),
            ));
        }
        let increasing = self
            .grid_distance_pct
            .windows(2)
            .all(|w| w[0] < w[1] && w[1] < 1.0);
        if !increasing {
            return Err(AnalysisError::MalformedBoundary(
                "grid is not strictly increasing within [0, 1)".into(),
            ));
        }
        Ok(())
    }

    /// Interpolated left and right edge points at a lap distance.
    ///
    /// Returns ((left_lat, left_lon), (right_lat, right_lon)).
    fn edges_at(&self, lap_distance_pct: f64) -> ((f64, f64), (f64, f64)) {
        let g = lap_distance_pct.rem_euclid(1.0);

        // grid[0] == 0, so there is always a lower neighbor.
        let i = match self.grid_distance_pct.partition_point(|&p| p <= g) {
            0 => self.grid_size - 1,
            n => n - 1,
        };
        let j = (i + 1) % self.grid_size;

        let gi = self.grid_distance_pct[i];
        let span = if j == 0 {
            1.0 - gi
        } else {
            self.grid_distance_pct[j] - gi
        };
        let t = if span > 0.0 { (g - gi) / span } else { 0.0 };

        let lerp = |a: f64, b: f64| a + t * (b - a);
        let left = (
            lerp(self.left_latitude[i], self.left_latitude[j]),
            lerp(self.left_longitude[i], self.left_longitude[j]),
        );
        let right = (
            lerp(self.right_latitude[i], self.right_latitude[j]),
            lerp(self.right_longitude[i], self.right_longitude[j]),
        );
        (left, right)
    }

    /// Signed lateral position of a single query point.
    ///
    /// Values outside [-1, 1] are returned unclamped; extrapolation means
    /// the point is off track.
    pub fn lateral_position(&self, lap_distance_pct: f64, latitude: f64, longitude: f64) -> f64 {
        let (left, right) = self.edges_at(lap_distance_pct);
        project_lateral(left, right, (latitude, longitude))
    }

    /// Lateral positions for a batch of (lap_distance_pct, latitude,
    /// longitude) queries.
    ///
    /// Produces the same values as the scalar form; exists so a whole lap
    /// can be augmented in one call.
    pub fn lateral_positions(&self, queries: &[(f64, f64, f64)]) -> Vec<f64> {
        queries
            .iter()
            .map(|&(pct, lat, lon)| self.lateral_position(pct, lat, lon))
            .collect()
    }
}

/// Project a query point onto the left->right segment in a local
/// equirectangular frame and map it to [-1, 1] across the track width.
fn project_lateral(left: (f64, f64), right: (f64, f64), point: (f64, f64)) -> f64 {
    let scale = ((left.0 + right.0) * 0.5).to_radians().cos();

    let (lx, ly) = (left.1 * scale, left.0);
    let (rx, ry) = (right.1 * scale, right.0);
    let (px, py) = (point.1 * scale, point.0);

    let (dx, dy) = (rx - lx, ry - ly);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        // Degenerate cell: left and right coincide.
        return 0.0;
    }

    let t = ((px - lx) * dx + (py - ly) * dy) / len_sq;
    2.0 * t - 1.0
}

/// Build a boundary from two demarcation laps.
///
/// Each lap is resampled onto a uniform grid of `grid_size` points in
/// [0, 1): for every grid point, the nearest lower source sample is
/// linearly blended with its successor, wrapping at 1.0.
///
/// # Errors
/// `InvalidBoundaryInput` when either lap has fewer than `grid_size / 2`
/// frames or covers less than 95% of the lap.
pub fn build_boundary(
    track_id: i32,
    track_config_name: Option<String>,
    left_lap: &[TelemetryFrame],
    right_lap: &[TelemetryFrame],
    grid_size: usize,
) -> Result<TrackBoundary, AnalysisError> {
    if grid_size == 0 {
        return Err(AnalysisError::InvalidBoundaryInput(
            "grid size must be positive".into(),
        ));
    }

    let (left_latitude, left_longitude) = resample_lap(left_lap, grid_size, "left")?;
    let (right_latitude, right_longitude) = resample_lap(right_lap, grid_size, "right")?;

    let grid_distance_pct = (0..grid_size)
        .map(|i| i as f64 / grid_size as f64)
        .collect();

    let track_length = left_lap
        .iter()
        .chain(right_lap)
        .map(|f| f.lap_distance)
        .fold(0.0, f64::max);
    let track_length = (track_length > 0.0).then_some(track_length);

    Ok(TrackBoundary {
        track_id,
        track_config_name,
        grid_size,
        grid_distance_pct,
        left_latitude,
        left_longitude,
        right_latitude,
        right_longitude,
        source_left_frames: left_lap.len(),
        source_right_frames: right_lap.len(),
        track_length,
    })
}

/// Resample one demarcation lap onto the uniform grid.
fn resample_lap(
    frames: &[TelemetryFrame],
    grid_size: usize,
    side: &str,
) -> Result<(Vec<f64>, Vec<f64>), AnalysisError> {
    if frames.len() < grid_size / 2 {
        return Err(AnalysisError::InvalidBoundaryInput(format!(
            "{side} lap has {} frames, need at least {}",
            frames.len(),
            grid_size / 2
        )));
    }

    let mut samples: Vec<(f64, f64, f64)> = frames
        .iter()
        .map(|f| (f.lap_distance_pct.rem_euclid(1.0), f.latitude, f.longitude))
        .collect();
    samples.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let coverage = samples[samples.len() - 1].0 - samples[0].0;
    if coverage < MIN_COVERAGE {
        return Err(AnalysisError::InvalidBoundaryInput(format!(
            "{side} lap covers {:.1}% of the track, need {:.0}%",
            coverage * 100.0,
            MIN_COVERAGE * 100.0
        )));
    }

    let mut latitudes = Vec::with_capacity(grid_size);
    let mut longitudes = Vec::with_capacity(grid_size);

    for i in 0..grid_size {
        let g = i as f64 / grid_size as f64;

        let upper_idx = samples.partition_point(|s| s.0 <= g);
        // Nearest lower neighbor, wrapping the last sample below 0 when the
        // grid point precedes every sample.
        let (lower, upper) = if upper_idx == 0 {
            let last = samples[samples.len() - 1];
            ((last.0 - 1.0, last.1, last.2), samples[0])
        } else if upper_idx == samples.len() {
            let first = samples[0];
            (
                samples[upper_idx - 1],
                (first.0 + 1.0, first.1, first.2),
            )
        } else {
            (samples[upper_idx - 1], samples[upper_idx])
        };

        let span = upper.0 - lower.0;
        let t = if span > 0.0 { (g - lower.0) / span } else { 0.0 };

        latitudes.push(lower.1 + t * (upper.1 - lower.1));
        longitudes.push(lower.2 + t * (upper.2 - lower.2));
    }

    Ok((latitudes, longitudes))
}

/// Augment every frame of a lap with its lateral position.
///
/// Pure function over the lap; frames far off the projection axis are
/// flagged as off-track candidates for the caller to filter.
pub fn augment_with_lateral_position(
    lap: &LapTelemetry,
    boundary: &TrackBoundary,
) -> AugmentedLapTelemetry {
    let queries: Vec<(f64, f64, f64)> = lap
        .frames
        .iter()
        .map(|f| (f.lap_distance_pct, f.latitude, f.longitude))
        .collect();
    let laterals = boundary.lateral_positions(&queries);

    let frames = lap
        .frames
        .iter()
        .zip(laterals)
        .map(|(frame, lateral_position)| AugmentedTelemetryFrame {
            frame: *frame,
            lateral_position,
            off_track_candidate: lateral_position.abs() > OFF_TRACK_LATERAL_LIMIT,
        })
        .collect();

    AugmentedLapTelemetry {
        frames,
        lap_time: lap.lap_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straight test track: runs along the latitude axis, left edge at
    /// longitude 0, right edge at longitude 0.001.
    fn straight_boundary() -> TrackBoundary {
        let grid_size = 100;
        let grid: Vec<f64> = (0..grid_size).map(|i| i as f64 / grid_size as f64).collect();
        let lat: Vec<f64> = grid.clone();

        TrackBoundary {
            track_id: 999,
            track_config_name: None,
            grid_size,
            grid_distance_pct: grid,
            left_latitude: lat.clone(),
            left_longitude: vec![0.0; grid_size],
            right_latitude: lat,
            right_longitude: vec![0.001; grid_size],
            source_left_frames: 100,
            source_right_frames: 100,
            track_length: Some(5000.0),
        }
    }

    fn boundary_frame(pct: f64, lat: f64, lon: f64) -> TelemetryFrame {
        TelemetryFrame {
            lap_distance_pct: pct,
            latitude: lat,
            longitude: lon,
            lap_distance: pct * 4000.0,
            ..Default::default()
        }
    }

    #[test]
    fn left_edge_is_minus_one() {
        let boundary = straight_boundary();
        let lateral = boundary.lateral_position(0.5, 0.5, 0.0);
        assert!((lateral + 1.0).abs() < 1e-6);
    }

    #[test]
    fn right_edge_is_plus_one() {
        let boundary = straight_boundary();
        let lateral = boundary.lateral_position(0.5, 0.5, 0.001);
        assert!((lateral - 1.0).abs() < 1e-6);
    }

    #[test]
    fn center_is_zero() {
        let boundary = straight_boundary();
        let lateral = boundary.lateral_position(0.5, 0.5, 0.0005);
        assert!(lateral.abs() < 1e-6);
    }

    #[test]
    fn extrapolates_beyond_edges_unclamped() {
        let boundary = straight_boundary();
        assert!((boundary.lateral_position(0.5, 0.5, -0.0005) + 2.0).abs() < 1e-6);
        assert!((boundary.lateral_position(0.5, 0.5, 0.0015) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn lap_distance_wraps() {
        let boundary = straight_boundary();
        let wrapped = boundary.lateral_position(1.5, 0.5, 0.0005);
        let direct = boundary.lateral_position(0.5, 0.5, 0.0005);
        assert!((wrapped - direct).abs() < 1e-9);
    }

    #[test]
    fn grid_identity_on_edges() {
        let boundary = straight_boundary();
        for i in 0..boundary.grid_size {
            let g = boundary.grid_distance_pct[i];
            let left = boundary.lateral_position(g, boundary.left_latitude[i], boundary.left_longitude[i]);
            let right =
                boundary.lateral_position(g, boundary.right_latitude[i], boundary.right_longitude[i]);
            assert!((left + 1.0).abs() < 1e-6, "left edge at grid {i}: {left}");
            assert!((right - 1.0).abs() < 1e-6, "right edge at grid {i}: {right}");
        }
    }

    #[test]
    fn degenerate_cell_returns_zero() {
        let mut boundary = straight_boundary();
        boundary.right_longitude = boundary.left_longitude.clone();
        assert_eq!(boundary.lateral_position(0.5, 0.5, 0.0005), 0.0);
    }

    #[test]
    fn vectorized_matches_scalar() {
        let boundary = straight_boundary();
        let queries: Vec<(f64, f64, f64)> = (0..100)
            .map(|i| {
                let p = 0.1 + 0.8 * i as f64 / 100.0;
                (p, p, 0.0003 + 0.0000041 * i as f64)
            })
            .collect();

        let batch = boundary.lateral_positions(&queries);
        for (&(p, lat, lon), batch_value) in queries.iter().zip(&batch) {
            let scalar = boundary.lateral_position(p, lat, lon);
            assert!((scalar - batch_value).abs() < 1e-6);
        }
    }

    #[test]
    fn builds_from_demarcation_laps() {
        let n = 1000;
        let left: Vec<TelemetryFrame> = (0..n)
            .map(|i| {
                let p = i as f64 / n as f64;
                boundary_frame(p, p, 0.0)
            })
            .collect();
        let right: Vec<TelemetryFrame> = (0..n)
            .map(|i| {
                let p = i as f64 / n as f64;
                boundary_frame(p, p, 0.001)
            })
            .collect();

        let boundary = build_boundary(42, Some("Grand Prix".into()), &left, &right, 500).unwrap();
        boundary.validate().unwrap();

        assert_eq!(boundary.grid_size, 500);
        assert_eq!(boundary.source_left_frames, 1000);
        let track_length = boundary.track_length.unwrap();
        assert!((track_length - 3996.0).abs() < 1e-6);

        let lateral = boundary.lateral_position(0.5, 0.5, 0.0005);
        assert!(lateral.abs() < 1e-3);
    }

    #[test]
    fn rectangular_track_centerline_reads_zero() {
        // Rectangle with one side per quarter lap; left/right edges offset
        // along the local normal so each pct lines up across the track.
        let width = 0.0005;
        let corners = [(0.0, 0.0), (0.0, 0.002), (0.001, 0.002), (0.001, 0.0)];
        let center_at = |p: f64| {
            let p = p.rem_euclid(1.0);
            let side = (p * 4.0).floor() as usize % 4;
            let q = p * 4.0 - side as f64;
            let (a, b) = (corners[side], corners[(side + 1) % 4]);
            (a.0 + q * (b.0 - a.0), a.1 + q * (b.1 - a.1))
        };
        let normal_at = |p: f64| {
            match ((p.rem_euclid(1.0)) * 4.0).floor() as usize % 4 {
                0 => (1.0, 0.0),
                1 => (0.0, 1.0),
                2 => (-1.0, 0.0),
                _ => (0.0, -1.0),
            }
        };

        let n = 2000;
        let lap = |sign: f64| -> Vec<TelemetryFrame> {
            (0..n)
                .map(|i| {
                    let p = i as f64 / n as f64;
                    let (clat, clon) = center_at(p);
                    let (nlat, nlon) = normal_at(p);
                    boundary_frame(p, clat + sign * width * nlat, clon + sign * width * nlon)
                })
                .collect()
        };

        let boundary = build_boundary(7, None, &lap(-1.0), &lap(1.0), 1000).unwrap();

        let mut worst: f64 = 0.0;
        for i in 0..1000 {
            let p = (i as f64 + 0.5) / 1000.0;
            let (clat, clon) = center_at(p);
            let lateral = boundary.lateral_position(p, clat, clon);
            worst = worst.max(lateral.abs());
        }
        assert!(worst < 1e-3, "worst centerline deviation: {worst}");
    }

    #[test]
    fn rejects_sparse_lap() {
        let left: Vec<TelemetryFrame> = (0..100)
            .map(|i| boundary_frame(i as f64 / 100.0, 0.0, 0.0))
            .collect();
        let result = build_boundary(1, None, &left, &left, 500);
        assert!(matches!(
            result,
            Err(AnalysisError::InvalidBoundaryInput(_))
        ));
    }

    #[test]
    fn rejects_low_coverage_lap() {
        // Plenty of frames, but only half the track.
        let partial: Vec<TelemetryFrame> = (0..1000)
            .map(|i| boundary_frame(0.5 * i as f64 / 1000.0, 0.0, 0.0))
            .collect();
        let result = build_boundary(1, None, &partial, &partial, 500);
        assert!(matches!(
            result,
            Err(AnalysisError::InvalidBoundaryInput(_))
        ));
    }

    #[test]
    fn augments_whole_lap() {
        let boundary = straight_boundary();
        let frames: Vec<TelemetryFrame> = (0..10)
            .map(|i| {
                let p = i as f64 / 10.0;
                boundary_frame(p, p, 0.0005)
            })
            .collect();
        let lap = LapTelemetry::from_frames(frames);

        let augmented = augment_with_lateral_position(&lap, &boundary);
        assert_eq!(augmented.frames.len(), 10);
        for frame in &augmented.frames {
            assert!(frame.lateral_position.abs() < 1e-6);
            assert!(!frame.off_track_candidate);
        }
    }

    #[test]
    fn far_away_query_is_flagged() {
        let boundary = straight_boundary();
        let frames = vec![boundary_frame(0.5, 0.5, 0.02)];
        let lap = LapTelemetry::new(frames, None);

        let augmented = augment_with_lateral_position(&lap, &boundary);
        assert!(augmented.frames[0].off_track_candidate);
        assert!(augmented.frames[0].lateral_position > OFF_TRACK_LATERAL_LIMIT);
    }
}

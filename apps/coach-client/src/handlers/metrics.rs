//! Metrics extraction from completed laps.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use coach_core::boundary::augment_with_lateral_position;
use coach_core::{analyze_lap, AnalysisConfig};
use eventbus::{EventHandler, HandlerContext, HandlerError};
use tracing::{debug, error, info};

use crate::events::{CoachEvent, LapCompletedPayload, LapMetricsPayload};
use crate::track::TrackBoundaryStore;

/// Handler that analyzes completed laps and publishes their metrics.
///
/// When the boundary store knows the session's track, the lap frames are
/// additionally augmented with lateral track position.
pub struct MetricsHandler {
    config: AnalysisConfig,
    boundaries: Option<Arc<dyn TrackBoundaryStore>>,
}

impl MetricsHandler {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            boundaries: None,
        }
    }

    pub fn with_boundary_store(mut self, store: Arc<dyn TrackBoundaryStore>) -> Self {
        self.boundaries = Some(store);
        self
    }

    /// Analyze one completed lap into a metrics event.
    ///
    /// Analysis failures are logged and swallowed; a bad lap must not take
    /// the pipeline down.
    async fn on_lap_completed(&self, payload: &LapCompletedPayload) -> Option<CoachEvent> {
        let started = Instant::now();

        let metrics = match analyze_lap(&payload.lap, &self.config) {
            Ok(metrics) => metrics,
            Err(err) => {
                error!(
                    "Failed to analyze lap {} ({}): {}",
                    payload.lap.lap_number().unwrap_or(-1),
                    payload.lap_id,
                    err
                );
                return None;
            }
        };

        info!(
            "Extracted metrics for lap {}: {} braking zones, {} corners ({:.1}ms)",
            metrics.lap_number,
            metrics.total_braking_zones,
            metrics.total_corners,
            started.elapsed().as_secs_f64() * 1000.0
        );

        for (i, zone) in metrics.braking_zones.iter().enumerate() {
            debug!(
                "  Braking zone {}: dist={:.3}, speed={:.1} m/s, max_pressure={:.2}, trail={}",
                i + 1,
                zone.braking_point_distance,
                zone.braking_point_speed,
                zone.max_brake_pressure,
                zone.has_trail_braking
            );
        }
        for (i, corner) in metrics.corners.iter().enumerate() {
            debug!(
                "  Corner {}: turn_in={:.3}, apex={:.3}, exit={:.3}, apex_speed={:.1} m/s",
                i + 1,
                corner.turn_in_distance,
                corner.apex_distance,
                corner.exit_distance,
                corner.apex_speed
            );
        }

        let augmented = self.augment(payload);

        Some(CoachEvent::LapMetricsExtracted(LapMetricsPayload {
            metrics: Arc::new(metrics),
            augmented,
            session: payload.session.clone(),
            lap_id: payload.lap_id,
        }))
    }

    /// Attach lateral positions when the track boundary is known.
    fn augment(
        &self,
        payload: &LapCompletedPayload,
    ) -> Option<Arc<coach_core::boundary::AugmentedLapTelemetry>> {
        let store = self.boundaries.as_ref()?;
        let boundary = store.get_boundary(
            payload.session.track_id,
            payload.session.track_config_name.as_deref(),
        )?;

        let augmented = augment_with_lateral_position(&payload.lap, &boundary);
        let off_track = augmented
            .frames
            .iter()
            .filter(|f| f.off_track_candidate)
            .count();
        debug!(
            "Augmented lap {} with lateral position ({} off-track candidates)",
            payload.lap_id, off_track
        );
        Some(Arc::new(augmented))
    }
}

#[async_trait]
impl EventHandler<CoachEvent> for MetricsHandler {
    fn name(&self) -> &'static str {
        "MetricsHandler"
    }

    async fn handle(
        &self,
        event: &CoachEvent,
        ctx: &HandlerContext<CoachEvent>,
    ) -> Result<(), HandlerError> {
        if let CoachEvent::LapCompleted(payload) = event {
            if let Some(metrics_event) = self.on_lap_completed(payload).await {
                ctx.publish(metrics_event).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coach_core::types::{SessionType, TrackType};
    use coach_core::{LapTelemetry, SessionDescriptor, TelemetryFrame, TrackBoundary};
    use uuid::Uuid;

    fn make_session(track_id: i32) -> SessionDescriptor {
        SessionDescriptor {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            track_id,
            track_name: "Test Track".into(),
            track_config_name: None,
            track_type: TrackType::RoadCourse,
            car_id: 1,
            car_name: "Test Car".into(),
            car_class_id: 1,
            series_id: 1,
            session_type: SessionType::Practice,
        }
    }

    fn braking_lap() -> LapTelemetry {
        let frames: Vec<TelemetryFrame> = (0..120)
            .map(|i| TelemetryFrame {
                lap_number: 1,
                session_time: i as f64 / 60.0,
                lap_distance_pct: i as f64 / 120.0,
                speed: if (40..70).contains(&i) { 40.0 } else { 50.0 },
                brake: if (40..70).contains(&i) { 0.6 } else { 0.0 },
                longitudinal_acceleration: if (40..70).contains(&i) { -8.0 } else { 0.0 },
                latitude: i as f64 / 120.0,
                longitude: 0.0005,
                ..Default::default()
            })
            .collect();
        LapTelemetry::from_frames(frames)
    }

    fn payload(lap: LapTelemetry, track_id: i32) -> LapCompletedPayload {
        LapCompletedPayload {
            lap: Arc::new(lap),
            session: make_session(track_id),
            lap_id: Uuid::new_v4(),
        }
    }

    /// Store with one straight test boundary under track id 1.
    struct OneBoundaryStore(Arc<TrackBoundary>);

    impl OneBoundaryStore {
        fn new() -> Self {
            let grid_size = 100;
            let grid: Vec<f64> = (0..grid_size).map(|i| i as f64 / grid_size as f64).collect();
            Self(Arc::new(TrackBoundary {
                track_id: 1,
                track_config_name: None,
                grid_size,
                grid_distance_pct: grid.clone(),
                left_latitude: grid.clone(),
                left_longitude: vec![0.0; grid_size],
                right_latitude: grid,
                right_longitude: vec![0.001; grid_size],
                source_left_frames: 100,
                source_right_frames: 100,
                track_length: None,
            }))
        }
    }

    impl TrackBoundaryStore for OneBoundaryStore {
        fn get_boundary(
            &self,
            track_id: i32,
            _track_config: Option<&str>,
        ) -> Option<Arc<TrackBoundary>> {
            (track_id == 1).then(|| Arc::clone(&self.0))
        }

        fn list_boundaries(&self) -> Vec<(i32, Option<String>)> {
            vec![(1, None)]
        }
    }

    #[tokio::test]
    async fn emits_metrics_for_completed_lap() {
        let handler = MetricsHandler::new(AnalysisConfig::default());
        let event = handler.on_lap_completed(&payload(braking_lap(), 1)).await;

        let Some(CoachEvent::LapMetricsExtracted(metrics)) = event else {
            panic!("expected LapMetricsExtracted");
        };
        assert_eq!(metrics.metrics.total_braking_zones, 1);
        assert!(metrics.augmented.is_none());
    }

    #[tokio::test]
    async fn augments_when_boundary_is_known() {
        let handler = MetricsHandler::new(AnalysisConfig::default())
            .with_boundary_store(Arc::new(OneBoundaryStore::new()));

        let event = handler.on_lap_completed(&payload(braking_lap(), 1)).await;
        let Some(CoachEvent::LapMetricsExtracted(metrics)) = event else {
            panic!("expected LapMetricsExtracted");
        };

        let augmented = metrics.augmented.expect("boundary was available");
        assert_eq!(augmented.frames.len(), 120);
        // All frames sit on the centerline of the test boundary.
        for frame in &augmented.frames {
            assert!(frame.lateral_position.abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn unknown_track_skips_augmentation() {
        let handler = MetricsHandler::new(AnalysisConfig::default())
            .with_boundary_store(Arc::new(OneBoundaryStore::new()));

        let event = handler.on_lap_completed(&payload(braking_lap(), 999)).await;
        let Some(CoachEvent::LapMetricsExtracted(metrics)) = event else {
            panic!("expected LapMetricsExtracted");
        };
        assert!(metrics.augmented.is_none());
    }

    #[tokio::test]
    async fn unanalyzable_lap_produces_no_event() {
        let handler = MetricsHandler::new(AnalysisConfig::default());
        let lap = LapTelemetry::from_frames(vec![TelemetryFrame::default()]);

        let event = handler.on_lap_completed(&payload(lap, 1)).await;
        assert!(event.is_none());
    }
}

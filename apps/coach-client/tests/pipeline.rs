//! End-to-end pipeline test: frames -> segmenter -> metrics over the bus.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use coach_client::events::{CoachEvent, CoachEventKind, LapMetricsPayload, TelemetryFramePayload};
use coach_client::handlers::{LapSegmenter, MetricsHandler};
use coach_core::types::{SessionType, TrackType};
use coach_core::{AnalysisConfig, SessionDescriptor, TelemetryFrame};
use eventbus::{EventBus, EventBusConfig, EventHandler, HandlerContext, HandlerError};
use uuid::Uuid;

/// Collects every metrics event it sees.
#[derive(Default)]
struct MetricsCollector {
    received: Mutex<Vec<LapMetricsPayload>>,
}

#[async_trait]
impl EventHandler<CoachEvent> for MetricsCollector {
    fn name(&self) -> &'static str {
        "MetricsCollector"
    }

    async fn handle(
        &self,
        event: &CoachEvent,
        _ctx: &HandlerContext<CoachEvent>,
    ) -> Result<(), HandlerError> {
        if let CoachEvent::LapMetricsExtracted(payload) = event {
            self.received.lock().unwrap().push(payload.clone());
        }
        Ok(())
    }
}

fn make_session() -> SessionDescriptor {
    SessionDescriptor {
        session_id: Uuid::new_v4(),
        created_at: Utc::now(),
        track_id: 142,
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

fn frame(lap: i32, pct: f64, t: f64, brake: f64, steering: f64) -> TelemetryFrame {
    TelemetryFrame {
        lap_number: lap,
        lap_distance_pct: pct,
        session_time: t,
        speed: if brake > 0.0 { 40.0 } else { 50.0 },
        brake,
        steering_angle: steering,
        throttle: if brake > 0.0 { 0.0 } else { 0.8 },
        longitudinal_acceleration: if brake > 0.0 { -8.0 } else { 0.0 },
        lateral_acceleration: steering * 20.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn completed_lap_flows_through_to_metrics() {
    let bus: EventBus<CoachEvent> = EventBus::with_config(EventBusConfig {
        queue_capacity: 4096,
        ..Default::default()
    });

    let segmenter: Arc<dyn EventHandler<CoachEvent>> = Arc::new(LapSegmenter::new());
    bus.subscribe(CoachEventKind::TelemetryFrame, segmenter.clone());
    bus.subscribe(CoachEventKind::SessionStart, segmenter.clone());
    bus.subscribe(CoachEventKind::SessionEnd, segmenter);

    bus.subscribe(
        CoachEventKind::LapCompleted,
        Arc::new(MetricsHandler::new(AnalysisConfig::default())),
    );

    let collector = Arc::new(MetricsCollector::default());
    bus.subscribe(CoachEventKind::LapMetricsExtracted, collector.clone());

    bus.start();

    let session = make_session();
    let session_id = session.session_id;
    bus.publish(CoachEvent::SessionStart(session)).await.unwrap();

    // Out lap: joins the track at 90%, discarded as a pit-exit partial.
    for (i, pct) in [0.90, 0.95].iter().enumerate() {
        bus.publish(CoachEvent::TelemetryFrame(TelemetryFramePayload {
            frame: frame(0, *pct, i as f64 / 60.0, 0.0, 0.0),
            session_id,
        }))
        .await
        .unwrap();
    }

    // Full lap 1 at 60 Hz with one braking zone and one corner.
    for i in 0..240 {
        let pct = i as f64 / 240.0;
        let t = 1.0 + i as f64 / 60.0;
        let brake = if (60..90).contains(&i) { 0.7 } else { 0.0 };
        let steering = if (90..150).contains(&i) { 0.3 } else { 0.0 };
        bus.publish(CoachEvent::TelemetryFrame(TelemetryFramePayload {
            frame: frame(1, pct, t, brake, steering),
            session_id,
        }))
        .await
        .unwrap();
    }

    // Lap change closes lap 1.
    bus.publish(CoachEvent::TelemetryFrame(TelemetryFramePayload {
        frame: frame(2, 0.001, 6.0, 0.0, 0.0),
        session_id,
    }))
    .await
    .unwrap();

    bus.publish(CoachEvent::SessionEnd { session_id }).await.unwrap();

    // The LapCompleted and LapMetricsExtracted hops happen inside handler
    // tasks; wait for the result rather than racing the stop.
    let mut received = Vec::new();
    for _ in 0..500 {
        received = collector.received.lock().unwrap().clone();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    bus.stop().await;

    assert_eq!(received.len(), 1, "expected metrics for exactly one lap");
    let payload = &received[0];
    assert_eq!(payload.metrics.lap_number, 1);
    assert_eq!(payload.metrics.total_braking_zones, 1);
    assert_eq!(payload.metrics.total_corners, 1);
    assert_eq!(payload.session.session_id, session_id);

    let zone = &payload.metrics.braking_zones[0];
    assert!((zone.braking_point_distance - 60.0 / 240.0).abs() < 1e-9);
    assert!(zone.max_brake_pressure >= 0.7);
}

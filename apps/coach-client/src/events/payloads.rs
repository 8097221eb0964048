//! Payload shapes carried by the pipeline events.

use std::sync::Arc;

use coach_core::boundary::AugmentedLapTelemetry;
use coach_core::{LapMetrics, LapTelemetry, SessionDescriptor, TelemetryFrame};
use uuid::Uuid;

/// One telemetry frame bound to its session.
#[derive(Debug, Clone)]
pub struct TelemetryFramePayload {
    pub frame: TelemetryFrame,
    pub session_id: Uuid,
}

/// A completed lap with its session context.
#[derive(Debug, Clone)]
pub struct LapCompletedPayload {
    pub lap: Arc<LapTelemetry>,
    pub session: SessionDescriptor,
    pub lap_id: Uuid,
}

/// Extracted metrics for a completed lap.
///
/// When a track boundary is known, the lap frames augmented with lateral
/// position ride along for downstream consumers.
#[derive(Debug, Clone)]
pub struct LapMetricsPayload {
    pub metrics: Arc<LapMetrics>,
    pub augmented: Option<Arc<AugmentedLapTelemetry>>,
    pub session: SessionDescriptor,
    pub lap_id: Uuid,
}

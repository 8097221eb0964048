//! Event vocabulary of the client pipeline.

mod payloads;

pub use payloads::{LapCompletedPayload, LapMetricsPayload, TelemetryFramePayload};

use coach_core::SessionDescriptor;
use eventbus::EventLike;
use uuid::Uuid;

/// Discriminant enum for subscription routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoachEventKind {
    TelemetryFrame,
    SessionStart,
    SessionEnd,
    LapCompleted,
    LapMetricsExtracted,
    ProducerTerminated,
}

/// All events flowing over the bus.
///
/// Frequent, heavy payloads (lap frame buffers, metrics) ride in `Arc` so
/// fan-out to several subscribers never copies the data.
#[derive(Debug, Clone)]
pub enum CoachEvent {
    /// One telemetry frame with its session context.
    TelemetryFrame(TelemetryFramePayload),

    /// A simulator session has started.
    SessionStart(SessionDescriptor),

    /// The session has ended; no more frames for this id.
    SessionEnd { session_id: Uuid },

    /// The segmenter completed a lap.
    LapCompleted(LapCompletedPayload),

    /// Metrics were extracted from a completed lap.
    LapMetricsExtracted(LapMetricsPayload),

    /// The producer gave up after repeated source failures; terminal.
    ProducerTerminated { reason: String },
}

impl EventLike for CoachEvent {
    type Kind = CoachEventKind;

    fn kind(&self) -> CoachEventKind {
        match self {
            CoachEvent::TelemetryFrame(_) => CoachEventKind::TelemetryFrame,
            CoachEvent::SessionStart(_) => CoachEventKind::SessionStart,
            CoachEvent::SessionEnd { .. } => CoachEventKind::SessionEnd,
            CoachEvent::LapCompleted(_) => CoachEventKind::LapCompleted,
            CoachEvent::LapMetricsExtracted(_) => CoachEventKind::LapMetricsExtracted,
            CoachEvent::ProducerTerminated { .. } => CoachEventKind::ProducerTerminated,
        }
    }
}

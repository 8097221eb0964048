//! Request and response shapes for the server API.

use chrono::{DateTime, Utc};
use coach_core::{LapMetrics, TelemetryFrame};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::{LapCompletedPayload, LapMetricsPayload};

/// Session metadata attached to every upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfoDto {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub track_id: i32,
    pub track_name: String,
    pub track_config_name: Option<String>,
    pub car_id: i32,
    pub car_name: String,
    pub car_class_id: i32,
    pub series_id: i32,
}

impl From<&coach_core::SessionDescriptor> for SessionInfoDto {
    fn from(session: &coach_core::SessionDescriptor) -> Self {
        Self {
            session_id: session.session_id,
            created_at: session.created_at,
            track_id: session.track_id,
            track_name: session.track_name.clone(),
            track_config_name: session.track_config_name.clone(),
            car_id: session.car_id,
            car_name: session.car_name.clone(),
            car_class_id: session.car_class_id,
            series_id: session.series_id,
        }
    }
}

/// Completed-lap telemetry upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct LapUploadRequest {
    pub lap_id: Uuid,
    pub session: SessionInfoDto,
    pub lap_number: i32,
    pub lap_time: Option<f64>,
    pub frames: Vec<TelemetryFrame>,
}

impl From<&LapCompletedPayload> for LapUploadRequest {
    fn from(payload: &LapCompletedPayload) -> Self {
        Self {
            lap_id: payload.lap_id,
            session: SessionInfoDto::from(&payload.session),
            lap_number: payload.lap.lap_number().unwrap_or(0),
            lap_time: payload.lap.lap_time,
            frames: payload.lap.frames.clone(),
        }
    }
}

/// Extracted lap metrics upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct LapMetricsUploadRequest {
    pub lap_id: Uuid,
    pub session: SessionInfoDto,
    pub metrics: LapMetrics,
}

impl From<&LapMetricsPayload> for LapMetricsUploadRequest {
    fn from(payload: &LapMetricsPayload) -> Self {
        Self {
            lap_id: payload.lap_id,
            session: SessionInfoDto::from(&payload.session),
            metrics: (*payload.metrics).clone(),
        }
    }
}

/// Server health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Acknowledgement for an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(default)]
    pub id: Option<Uuid>,
}

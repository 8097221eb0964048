//! Thin reqwest client over the server endpoints.

use tracing::debug;

use crate::events::{LapCompletedPayload, LapMetricsPayload};

use super::models::{HealthResponse, LapMetricsUploadRequest, LapUploadRequest, UploadResponse};

/// API client errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// Client for the coach server upload API.
pub struct CoachApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl CoachApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }
        Ok(response.json().await?)
    }

    /// Probe server availability.
    pub async fn health_check(&self) -> Result<HealthResponse, ApiError> {
        let response = self.http.get(self.url("/api/v1/health")).send().await?;
        Self::check(response).await
    }

    /// Upload a completed lap's telemetry.
    pub async fn upload_lap(&self, payload: &LapCompletedPayload) -> Result<UploadResponse, ApiError> {
        let request = LapUploadRequest::from(payload);
        debug!(
            "Uploading lap {} with {} frames",
            request.lap_id,
            request.frames.len()
        );
        let response = self
            .http
            .post(self.url("/api/v1/laps"))
            .json(&request)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Upload extracted metrics for a lap.
    pub async fn upload_metrics(
        &self,
        payload: &LapMetricsPayload,
    ) -> Result<UploadResponse, ApiError> {
        let request = LapMetricsUploadRequest::from(payload);
        debug!("Uploading metrics for lap {}", request.lap_id);
        let response = self
            .http
            .post(self.url("/api/v1/metrics"))
            .json(&request)
            .send()
            .await?;
        Self::check(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coach_core::types::{SessionType, TrackType};
    use coach_core::{AnalysisConfig, LapTelemetry, SessionDescriptor, TelemetryFrame};
    use std::sync::Arc;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

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

    fn lap_payload() -> LapCompletedPayload {
        let frames: Vec<TelemetryFrame> = (0..10)
            .map(|i| TelemetryFrame {
                session_time: i as f64,
                lap_number: 1,
                ..Default::default()
            })
            .collect();
        LapCompletedPayload {
            lap: Arc::new(LapTelemetry::from_frames(frames)),
            session: make_session(),
            lap_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn health_check_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let client = CoachApiClient::new(&server.uri());
        let health = client.health_check().await.unwrap();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn upload_lap_posts_frames() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/laps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "accepted",
                "id": Uuid::new_v4(),
            })))
            .mount(&server)
            .await;

        let client = CoachApiClient::new(&server.uri());
        let response = client.upload_lap(&lap_payload()).await.unwrap();
        assert_eq!(response.status, "accepted");
        assert!(response.id.is_some());
    }

    #[tokio::test]
    async fn upload_metrics_posts_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "accepted"
            })))
            .mount(&server)
            .await;

        let lap = lap_payload();
        let metrics =
            coach_core::analyze_lap(&lap.lap, &AnalysisConfig::default()).unwrap();
        let payload = LapMetricsPayload {
            metrics: Arc::new(metrics),
            augmented: None,
            session: lap.session.clone(),
            lap_id: lap.lap_id,
        };

        let client = CoachApiClient::new(&server.uri());
        let response = client.upload_metrics(&payload).await.unwrap();
        assert_eq!(response.status, "accepted");
    }

    #[tokio::test]
    async fn server_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = CoachApiClient::new(&server.uri());
        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 503));
    }
}

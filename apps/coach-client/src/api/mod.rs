//! HTTP client for the coach server API.

mod client;
mod models;

pub use client::{ApiError, CoachApiClient};
pub use models::{
    HealthResponse, LapMetricsUploadRequest, LapUploadRequest, SessionInfoDto, UploadResponse,
};

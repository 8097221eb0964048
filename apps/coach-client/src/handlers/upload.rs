//! Forwarding of completed laps and metrics to the server.

use std::sync::Arc;

use async_trait::async_trait;
use eventbus::{EventHandler, HandlerContext, HandlerError};
use tracing::{info, warn};

use crate::api::CoachApiClient;
use crate::events::CoachEvent;

/// Handler that uploads completed laps and extracted metrics.
///
/// Upload failures are logged and reported as handler errors; the bus
/// absorbs them so the analysis pipeline keeps running when the server is
/// unreachable.
pub struct UploadHandler {
    client: Arc<CoachApiClient>,
}

impl UploadHandler {
    pub fn new(client: Arc<CoachApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventHandler<CoachEvent> for UploadHandler {
    fn name(&self) -> &'static str {
        "UploadHandler"
    }

    async fn handle(
        &self,
        event: &CoachEvent,
        _ctx: &HandlerContext<CoachEvent>,
    ) -> Result<(), HandlerError> {
        match event {
            CoachEvent::LapCompleted(payload) => {
                match self.client.upload_lap(payload).await {
                    Ok(response) => {
                        info!(
                            "Uploaded lap {} ({} frames): {}",
                            payload.lap_id,
                            payload.lap.len(),
                            response.status
                        );
                        Ok(())
                    }
                    Err(err) => {
                        warn!("Lap upload failed for {}: {}", payload.lap_id, err);
                        Err(HandlerError::Processing(err.to_string()))
                    }
                }
            }
            CoachEvent::LapMetricsExtracted(payload) => {
                match self.client.upload_metrics(payload).await {
                    Ok(response) => {
                        info!(
                            "Uploaded metrics for lap {}: {}",
                            payload.lap_id, response.status
                        );
                        Ok(())
                    }
                    Err(err) => {
                        warn!("Metrics upload failed for {}: {}", payload.lap_id, err);
                        Err(HandlerError::Processing(err.to_string()))
                    }
                }
            }
            _ => Ok(()),
        }
    }
}

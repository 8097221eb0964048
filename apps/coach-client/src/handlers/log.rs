//! Diagnostic frame sampling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use coach_core::SessionRegistry;
use eventbus::{EventHandler, HandlerContext, HandlerError};
use tracing::info;

use crate::events::CoachEvent;

/// Logs every N-th telemetry frame.
pub struct LogHandler {
    log_frequency: u64,
    frame_count: AtomicU64,
    registry: Arc<SessionRegistry>,
}

impl LogHandler {
    pub fn new(log_frequency: usize, registry: Arc<SessionRegistry>) -> Self {
        Self {
            log_frequency: log_frequency.max(1) as u64,
            frame_count: AtomicU64::new(0),
            registry,
        }
    }
}

#[async_trait]
impl EventHandler<CoachEvent> for LogHandler {
    fn name(&self) -> &'static str {
        "LogHandler"
    }

    async fn handle(
        &self,
        event: &CoachEvent,
        _ctx: &HandlerContext<CoachEvent>,
    ) -> Result<(), HandlerError> {
        match event {
            CoachEvent::TelemetryFrame(payload) => {
                let count = self.frame_count.fetch_add(1, Ordering::Relaxed);
                if count % self.log_frequency == 0 {
                    let frame = &payload.frame;
                    let track = self
                        .registry
                        .current()
                        .map(|s| s.track_name)
                        .unwrap_or_default();
                    info!(
                        "Frame {}: speed={:.1} m/s, rpm={:.0}, gear={}, lap={}, dist={:.1}% {}",
                        count,
                        frame.speed,
                        frame.rpm,
                        frame.gear,
                        frame.lap_number,
                        frame.lap_distance_pct * 100.0,
                        track
                    );
                }
            }
            CoachEvent::SessionEnd { session_id } => {
                info!(
                    "Session {}: observed {} telemetry frames",
                    session_id,
                    self.frame_count.load(Ordering::Relaxed)
                );
            }
            _ => {}
        }
        Ok(())
    }
}

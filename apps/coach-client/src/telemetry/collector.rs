//! Producer loop bridging a telemetry source to the event bus.

use std::sync::Arc;
use std::time::Duration;

use coach_core::SessionRegistry;
use eventbus::{BusError, EventPublisher};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::{CoachEvent, TelemetryFramePayload};

use super::source::{SourceError, TelemetrySource};

/// Attempts before a transient source failure becomes terminal.
const MAX_SOURCE_RETRIES: u32 = 5;
/// Base delay of the exponential backoff between retries.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Telemetry collector errors.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("event bus error: {0}")]
    Bus(#[from] BusError),
}

/// Producer that pulls frames from a source at the source's native rate
/// and publishes them onto the bus.
///
/// One collector runs per session; it owns the source for its lifetime.
/// Invalid frames are dropped with a log line and the loop continues;
/// transient source failures are retried with exponential backoff before
/// the producer gives up and announces `ProducerTerminated`.
pub struct TelemetryCollector {
    cancel: CancellationToken,
    registry: Arc<SessionRegistry>,
}

impl TelemetryCollector {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            registry,
        }
    }

    /// Cancellation token for external shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        info!("Collector shutdown requested");
        self.cancel.cancel();
    }

    /// Run the collection loop to completion.
    pub async fn run(
        self,
        mut source: Box<dyn TelemetrySource>,
        publisher: EventPublisher<CoachEvent>,
    ) -> Result<(), CollectorError> {
        self.connect_with_retry(source.as_mut(), &publisher).await?;

        let Some(session) = source.session() else {
            let reason = "source produced no session metadata".to_string();
            error!("{reason}");
            let _ = publisher
                .publish(CoachEvent::ProducerTerminated { reason })
                .await;
            return Err(CollectorError::Source(SourceError::NotConnected));
        };
        let session_id = session.session_id;

        self.registry.start_session(session.clone());
        publisher.publish(CoachEvent::SessionStart(session)).await?;

        let hz = source.source_hz().clamp(1.0, 1000.0);
        let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / hz));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Starting telemetry collection loop at {hz:.0}Hz");

        let mut frame_count: u64 = 0;
        let mut dropped: u64 = 0;
        let mut retries: u32 = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Collector cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    match source.freeze_latest() {
                        Ok(()) => retries = 0,
                        Err(SourceError::EndOfData) => {
                            info!("Telemetry stream ended");
                            break;
                        }
                        Err(err) => {
                            retries += 1;
                            if retries >= MAX_SOURCE_RETRIES {
                                let reason = format!(
                                    "source failed after {retries} attempts: {err}"
                                );
                                error!("{reason}");
                                let _ = publisher
                                    .publish(CoachEvent::ProducerTerminated { reason })
                                    .await;
                                break;
                            }
                            let delay = RETRY_BASE_DELAY * 2u32.pow(retries - 1);
                            warn!(
                                "Source failure ({err}), retry {retries}/{MAX_SOURCE_RETRIES} in {delay:?}"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }

                    let frame = match source.frame() {
                        Ok(frame) => frame,
                        Err(err) => {
                            warn!("Failed to read frozen frame: {err}");
                            continue;
                        }
                    };

                    if let Err(err) = frame.validate() {
                        dropped += 1;
                        warn!("Dropping invalid frame: {err}");
                        continue;
                    }

                    let event = CoachEvent::TelemetryFrame(TelemetryFramePayload {
                        frame,
                        session_id,
                    });
                    match publisher.publish(event).await {
                        Ok(()) => frame_count += 1,
                        Err(BusError::NotRunning | BusError::Closed) => {
                            info!("Event bus stopped, ending collection");
                            break;
                        }
                        Err(err) => warn!("Failed to publish frame: {err}"),
                    }

                    if frame_count % 1000 == 0 && frame_count > 0 {
                        debug!(
                            "Collected {} frames (lap {}, {:.1}%)",
                            frame_count,
                            frame.lap_number,
                            frame.lap_distance_pct * 100.0
                        );
                    }
                }
            }
        }

        let _ = publisher
            .publish(CoachEvent::SessionEnd { session_id })
            .await;
        self.registry.end_session(session_id);

        info!(
            "Telemetry collection complete: {} frames published, {} dropped",
            frame_count, dropped
        );
        Ok(())
    }

    /// Connect to the source, retrying transient failures with backoff.
    async fn connect_with_retry(
        &self,
        source: &mut dyn TelemetrySource,
        publisher: &EventPublisher<CoachEvent>,
    ) -> Result<(), CollectorError> {
        let mut attempt: u32 = 0;
        loop {
            match source.connect() {
                Ok(()) => {
                    info!("Telemetry source connected at {:.0}Hz", source.source_hz());
                    return Ok(());
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= MAX_SOURCE_RETRIES {
                        let reason = format!("connect failed after {attempt} attempts: {err}");
                        error!("{reason}");
                        let _ = publisher
                            .publish(CoachEvent::ProducerTerminated { reason })
                            .await;
                        return Err(err.into());
                    }
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                    warn!("Connect failed ({err}), retry {attempt}/{MAX_SOURCE_RETRIES} in {delay:?}");
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            return Err(CollectorError::Source(SourceError::NotConnected));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ReplaySource;
    use coach_core::types::{SessionType, TrackType};
    use coach_core::{SessionDescriptor, TelemetryFrame};
    use eventbus::{EventBus, EventBusConfig};
    use uuid::Uuid;

    fn make_session() -> SessionDescriptor {
        SessionDescriptor {
            session_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            track_id: 1,
            track_name: "Test".into(),
            track_config_name: None,
            track_type: TrackType::RoadCourse,
            car_id: 1,
            car_name: "Car".into(),
            car_class_id: 1,
            series_id: 1,
            session_type: SessionType::Practice,
        }
    }

    fn make_frames(n: usize) -> Vec<TelemetryFrame> {
        (0..n)
            .map(|i| TelemetryFrame {
                // High nominal rate keeps the test fast.
                session_time: i as f64 / 1000.0,
                speed: 40.0,
                ..Default::default()
            })
            .collect()
    }

    /// Source that always fails to connect.
    struct BrokenSource;

    impl TelemetrySource for BrokenSource {
        fn connect(&mut self) -> Result<(), SourceError> {
            Err(SourceError::Transient("simulator offline".into()))
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn freeze_latest(&mut self) -> Result<(), SourceError> {
            Err(SourceError::NotConnected)
        }
        fn frame(&self) -> Result<TelemetryFrame, SourceError> {
            Err(SourceError::NotConnected)
        }
        fn session(&self) -> Option<SessionDescriptor> {
            None
        }
        fn source_hz(&self) -> f64 {
            60.0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replay_session_runs_to_completion() {
        let registry = Arc::new(SessionRegistry::new());
        let bus: EventBus<CoachEvent> = EventBus::with_config(EventBusConfig {
            queue_capacity: 4096,
            ..Default::default()
        });

        let source = ReplaySource::new(make_frames(50), make_session());
        let collector = TelemetryCollector::new(registry.clone());

        collector
            .run(Box::new(source), bus.publisher())
            .await
            .unwrap();

        // Session ended and deregistered.
        assert!(!registry.has_active_session());
    }

    #[tokio::test(start_paused = true)]
    async fn broken_source_terminates_producer() {
        let registry = Arc::new(SessionRegistry::new());
        let bus: EventBus<CoachEvent> = EventBus::new();

        let collector = TelemetryCollector::new(registry.clone());
        let result = collector.run(Box::new(BrokenSource), bus.publisher()).await;

        assert!(matches!(result, Err(CollectorError::Source(_))));
        assert!(!registry.has_active_session());
    }
}

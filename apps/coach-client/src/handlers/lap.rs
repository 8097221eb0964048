//! Lap segmentation: frame events in, completed-lap events out.

use std::sync::Arc;

use async_trait::async_trait;
use coach_core::{LapTelemetry, SessionDescriptor, TelemetryFrame};
use eventbus::{EventHandler, HandlerContext, HandlerError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{CoachEvent, LapCompletedPayload, TelemetryFramePayload};

/// Configuration for lap segmentation.
#[derive(Debug, Clone)]
pub struct LapSegmenterConfig {
    /// Minimum lap distance fraction of the frame that triggers a lap
    /// change, below which a change out of the first observed lap counts
    /// as a pit exit rather than a completion (0.0-1.0).
    pub lap_completion_threshold: f64,
}

impl Default for LapSegmenterConfig {
    fn default() -> Self {
        Self {
            lap_completion_threshold: 0.95,
        }
    }
}

/// Internal segmentation state.
struct SegmenterState {
    /// Lap currently being buffered; `None` until the first frame after a
    /// session (re)start.
    current_lap: Option<i32>,
    /// Whether the buffered lap is the first one observed since a reset.
    /// The first observed lap is a pit exit or a mid-lap join; it never
    /// has a trustworthy start and is discarded at its boundary.
    buffering_first: bool,
    buffer: Vec<TelemetryFrame>,
    current_session: Option<SessionDescriptor>,
    last_session_id: Option<Uuid>,
    frames_seen: u64,
    partials_discarded: u64,
}

impl Default for SegmenterState {
    fn default() -> Self {
        Self {
            current_lap: None,
            buffering_first: true,
            // Pre-allocate for a ~2.5 minute lap at 60 Hz.
            buffer: Vec::with_capacity(10_000),
            current_session: None,
            last_session_id: None,
            frames_seen: 0,
            partials_discarded: 0,
        }
    }
}

/// Handler that buffers telemetry frames and publishes completed laps.
///
/// Lap boundaries are detected by lap-number change, not distance
/// rollover: the simulator may increment the lap counter at the finish
/// line before the distance wraps.
pub struct LapSegmenter {
    config: LapSegmenterConfig,
    state: RwLock<SegmenterState>,
}

impl LapSegmenter {
    pub fn new() -> Self {
        Self::with_config(LapSegmenterConfig::default())
    }

    pub fn with_config(config: LapSegmenterConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SegmenterState::default()),
        }
    }

    async fn on_session_start(&self, session: &SessionDescriptor) {
        let mut state = self.state.write().await;

        if !state.buffer.is_empty() {
            info!(
                "New session, discarding {} buffered frames",
                state.buffer.len()
            );
            let discarded = state.buffer.len() as u64;
            state.partials_discarded += discarded;
            state.buffer.clear();
        }

        state.current_session = Some(session.clone());
        state.last_session_id = Some(session.session_id);
        state.current_lap = None;
        state.buffering_first = true;

        info!(
            "Segmenting session {}: {} - {}",
            session.session_id, session.track_name, session.car_name
        );
    }

    async fn on_session_end(&self, session_id: Uuid) {
        let mut state = self.state.write().await;
        info!(
            "Session {} complete: {} frames seen, {} discarded as partials",
            session_id, state.frames_seen, state.partials_discarded
        );
        if !state.buffer.is_empty() {
            debug!(
                "Discarding {} frames of the unfinished final lap",
                state.buffer.len()
            );
            let discarded = state.buffer.len() as u64;
            state.partials_discarded += discarded;
            state.buffer.clear();
        }
        state.current_lap = None;
        state.buffering_first = true;
    }

    /// Apply the segmentation rules to one frame, possibly producing a
    /// completed-lap event.
    async fn on_frame(&self, payload: &TelemetryFramePayload) -> Option<CoachEvent> {
        let frame = &payload.frame;
        let mut state = self.state.write().await;
        state.frames_seen += 1;

        // Session change has top precedence: a buffered lap from another
        // session can never be completed by this frame.
        if state.last_session_id != Some(payload.session_id) {
            if !state.buffer.is_empty() {
                warn!(
                    "Session changed mid-lap, discarding {} buffered frames",
                    state.buffer.len()
                );
                let discarded = state.buffer.len() as u64;
                state.partials_discarded += discarded;
                state.buffer.clear();
            }
            state.last_session_id = Some(payload.session_id);
            state.current_lap = None;
            state.buffering_first = true;
        }

        let mut completed = None;

        if state.current_lap != Some(frame.lap_number) {
            debug!(
                "Lap change detected: {:?} -> {}",
                state.current_lap, frame.lap_number
            );

            if state.buffering_first
                && frame.lap_distance_pct < self.config.lap_completion_threshold
            {
                // Leaving the pits or joining mid-lap: the buffered lap
                // has no trustworthy start, so it is not a real lap.
                if !state.buffer.is_empty() {
                    debug!(
                        "Discarding {} pit-exit frames before lap {}",
                        state.buffer.len(),
                        frame.lap_number
                    );
                    let discarded = state.buffer.len() as u64;
                    state.partials_discarded += discarded;
                    state.buffer.clear();
                }
                // Once an actual first lap has been thrown away, the next
                // lap starts at the line and is complete.
                if state.current_lap.is_some() {
                    state.buffering_first = false;
                }
            } else if !state.buffer.is_empty() {
                completed = self.complete_lap(&mut state);
                state.buffering_first = false;
            }

            state.current_lap = Some(frame.lap_number);
        }

        state.buffer.push(*frame);
        completed
    }

    /// Drain the buffer into a completed-lap event.
    fn complete_lap(&self, state: &mut SegmenterState) -> Option<CoachEvent> {
        let Some(session) = state.current_session.clone() else {
            warn!(
                "Completed lap with no session context, discarding {} frames",
                state.buffer.len()
            );
            let discarded = state.buffer.len() as u64;
            state.partials_discarded += discarded;
            state.buffer.clear();
            return None;
        };

        let frames = std::mem::take(&mut state.buffer);
        let lap = LapTelemetry::from_frames(frames);
        let lap_id = Uuid::new_v4();

        info!(
            "Lap {} finished with {} frames (time: {:?})",
            lap.lap_number().unwrap_or(-1),
            lap.len(),
            lap.lap_time
        );

        Some(CoachEvent::LapCompleted(LapCompletedPayload {
            lap: Arc::new(lap),
            session,
            lap_id,
        }))
    }
}

impl Default for LapSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventHandler<CoachEvent> for LapSegmenter {
    fn name(&self) -> &'static str {
        "LapSegmenter"
    }

    async fn handle(
        &self,
        event: &CoachEvent,
        ctx: &HandlerContext<CoachEvent>,
    ) -> Result<(), HandlerError> {
        match event {
            CoachEvent::SessionStart(session) => {
                self.on_session_start(session).await;
            }
            CoachEvent::SessionEnd { session_id } => {
                self.on_session_end(*session_id).await;
            }
            CoachEvent::TelemetryFrame(payload) => {
                if let Some(lap_event) = self.on_frame(payload).await {
                    ctx.publish(lap_event).await?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

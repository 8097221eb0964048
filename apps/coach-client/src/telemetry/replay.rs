//! Offline replay source over pre-recorded frames.

use std::path::Path;

use chrono::Utc;
use coach_core::types::{SessionType, TrackType};
use coach_core::{SessionDescriptor, TelemetryFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::source::{SourceError, TelemetrySource};

const DEFAULT_HZ: f64 = 60.0;

/// On-disk shape of a recorded session: optional session metadata plus the
/// raw frame list.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplayFile {
    pub session: Option<SessionDescriptor>,
    pub frames: Vec<TelemetryFrame>,
}

/// Replay source over an in-memory buffer of pre-read frames.
///
/// A monotonic cursor advances by `ceil(speed_multiplier)` frames per
/// `freeze_latest`. At the end of the buffer the cursor wraps to the start
/// when looping, otherwise it clamps to the last frame and the following
/// advance reports `EndOfData`.
pub struct ReplaySource {
    frames: Vec<TelemetryFrame>,
    session: SessionDescriptor,
    cursor: usize,
    speed_multiplier: f64,
    loop_playback: bool,
    connected: bool,
    source_hz: f64,
}

impl ReplaySource {
    pub fn new(frames: Vec<TelemetryFrame>, session: SessionDescriptor) -> Self {
        let source_hz = estimate_rate(&frames);
        Self {
            frames,
            session,
            cursor: 0,
            speed_multiplier: 1.0,
            loop_playback: false,
            connected: false,
            source_hz,
        }
    }

    /// Load a recorded session from a JSON frame file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        info!("Opening replay file: {}", path.display());

        let raw = std::fs::read(path)
            .map_err(|e| SourceError::Transient(format!("read {}: {e}", path.display())))?;
        let replay: ReplayFile = serde_json::from_slice(&raw)
            .map_err(|e| SourceError::Transient(format!("parse {}: {e}", path.display())))?;

        let session = replay
            .session
            .unwrap_or_else(|| synthetic_session(path, &replay.frames));
        let source = Self::new(replay.frames, session);
        debug!(
            "Replay loaded: {} frames at {:.0}Hz",
            source.frames.len(),
            source.source_hz
        );
        Ok(source)
    }

    pub fn with_speed_multiplier(mut self, speed: f64) -> Self {
        self.speed_multiplier = speed.max(f64::MIN_POSITIVE);
        self
    }

    pub fn with_loop(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Playback progress as a percentage of the buffer.
    pub fn playback_progress(&self) -> f64 {
        if self.frames.is_empty() {
            return 0.0;
        }
        self.cursor as f64 * 100.0 / self.frames.len() as f64
    }
}

impl TelemetrySource for ReplaySource {
    fn connect(&mut self) -> Result<(), SourceError> {
        if self.frames.is_empty() {
            return Err(SourceError::Transient("replay buffer is empty".into()));
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn freeze_latest(&mut self) -> Result<(), SourceError> {
        if !self.connected {
            return Err(SourceError::NotConnected);
        }

        let step = (self.speed_multiplier.ceil() as usize).max(1);
        let next = self.cursor + step;

        if next < self.frames.len() {
            self.cursor = next;
        } else if self.loop_playback {
            self.cursor = next % self.frames.len();
        } else if self.cursor + 1 < self.frames.len() {
            // Clamp to the final frame; the next advance signals the end.
            self.cursor = self.frames.len() - 1;
        } else {
            return Err(SourceError::EndOfData);
        }
        Ok(())
    }

    fn frame(&self) -> Result<TelemetryFrame, SourceError> {
        if !self.connected {
            return Err(SourceError::NotConnected);
        }
        Ok(self.frames[self.cursor])
    }

    fn session(&self) -> Option<SessionDescriptor> {
        Some(self.session.clone())
    }

    fn source_hz(&self) -> f64 {
        self.source_hz
    }
}

/// Estimate the sample rate from consecutive session times.
fn estimate_rate(frames: &[TelemetryFrame]) -> f64 {
    let mut deltas: Vec<f64> = frames
        .windows(2)
        .map(|w| w[1].session_time - w[0].session_time)
        .filter(|&d| d > 0.0)
        .collect();
    if deltas.is_empty() {
        return DEFAULT_HZ;
    }
    deltas.sort_unstable_by(f64::total_cmp);
    1.0 / deltas[deltas.len() / 2]
}

/// Fallback session descriptor for recordings without metadata.
fn synthetic_session(path: &Path, frames: &[TelemetryFrame]) -> SessionDescriptor {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    SessionDescriptor {
        session_id: Uuid::new_v4(),
        created_at: frames.first().map(|f| f.timestamp).unwrap_or_else(Utc::now),
        track_id: 0,
        track_name: name,
        track_config_name: None,
        track_type: TrackType::RoadCourse,
        car_id: 0,
        car_name: String::new(),
        car_class_id: 0,
        series_id: 0,
        session_type: SessionType::Practice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frames(n: usize) -> Vec<TelemetryFrame> {
        (0..n)
            .map(|i| TelemetryFrame {
                session_time: i as f64 / 60.0,
                speed: i as f64,
                ..Default::default()
            })
            .collect()
    }

    fn make_session() -> SessionDescriptor {
        synthetic_session(Path::new("test.json"), &[])
    }

    fn connected(frames: usize) -> ReplaySource {
        let mut source = ReplaySource::new(make_frames(frames), make_session());
        source.connect().unwrap();
        source
    }

    #[test]
    fn starts_at_frame_zero() {
        let source = connected(100);
        assert_eq!(source.cursor(), 0);
        assert!(source.is_connected());
    }

    #[test]
    fn freeze_advances_one_frame() {
        let mut source = connected(10);
        source.freeze_latest().unwrap();
        assert_eq!(source.cursor(), 1);
        assert_eq!(source.frame().unwrap().speed, 1.0);
    }

    #[test]
    fn double_speed_advances_two_frames() {
        let mut source = connected(100).with_speed_multiplier(2.0);
        source.connect().unwrap();
        source.freeze_latest().unwrap();
        assert_eq!(source.cursor(), 2);
    }

    #[test]
    fn fractional_speed_rounds_up() {
        let mut source = connected(100).with_speed_multiplier(1.5);
        source.connect().unwrap();
        source.freeze_latest().unwrap();
        assert_eq!(source.cursor(), 2);
    }

    #[test]
    fn loop_wraps_to_beginning() {
        let mut source = connected(10).with_loop(true);
        source.connect().unwrap();
        for _ in 0..9 {
            source.freeze_latest().unwrap();
        }
        assert_eq!(source.cursor(), 9);

        source.freeze_latest().unwrap();
        assert_eq!(source.cursor(), 0);
    }

    #[test]
    fn without_loop_clamps_then_ends() {
        let mut source = connected(10).with_speed_multiplier(4.0);
        source.connect().unwrap();
        source.freeze_latest().unwrap(); // 4
        source.freeze_latest().unwrap(); // 8
        source.freeze_latest().unwrap(); // clamped to 9
        assert_eq!(source.cursor(), 9);

        assert!(matches!(
            source.freeze_latest(),
            Err(SourceError::EndOfData)
        ));
        assert_eq!(source.cursor(), 9);
    }

    #[test]
    fn unconnected_source_refuses_reads() {
        let mut source = ReplaySource::new(make_frames(5), make_session());
        assert!(matches!(
            source.freeze_latest(),
            Err(SourceError::NotConnected)
        ));
        assert!(matches!(source.frame(), Err(SourceError::NotConnected)));
    }

    #[test]
    fn empty_buffer_fails_to_connect() {
        let mut source = ReplaySource::new(vec![], make_session());
        assert!(matches!(
            source.connect(),
            Err(SourceError::Transient(_))
        ));
    }

    #[test]
    fn playback_progress_tracks_cursor() {
        let mut source = connected(100);
        assert_eq!(source.playback_progress(), 0.0);
        for _ in 0..50 {
            source.freeze_latest().unwrap();
        }
        assert_eq!(source.playback_progress(), 50.0);
    }

    #[test]
    fn rate_estimated_from_session_times() {
        let source = connected(100);
        assert!((source.source_hz() - 60.0).abs() < 1.0);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let replay = ReplayFile {
            session: None,
            frames: make_frames(20),
        };
        std::fs::write(&path, serde_json::to_vec(&replay).unwrap()).unwrap();

        let mut source = ReplaySource::from_file(&path).unwrap();
        source.connect().unwrap();
        assert_eq!(source.session().unwrap().track_name, "session");
        source.freeze_latest().unwrap();
        assert_eq!(source.frame().unwrap().speed, 1.0);
    }
}

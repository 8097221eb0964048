//! Completed-lap telemetry sequence.

use serde::{Deserialize, Serialize};

use super::TelemetryFrame;

/// Ordered, non-empty sequence of frames sharing one lap number.
///
/// Frames are sorted by session time, strictly non-decreasing; the
/// segmenter maintains this by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LapTelemetry {
    pub frames: Vec<TelemetryFrame>,
    /// Lap time in seconds, when known.
    pub lap_time: Option<f64>,
}

impl LapTelemetry {
    pub fn new(frames: Vec<TelemetryFrame>, lap_time: Option<f64>) -> Self {
        Self { frames, lap_time }
    }

    /// Build a lap from frames, deriving the lap time from the first and
    /// last session times when at least two frames are present.
    pub fn from_frames(frames: Vec<TelemetryFrame>) -> Self {
        let lap_time = match (frames.first(), frames.last()) {
            (Some(first), Some(last)) if frames.len() >= 2 => {
                Some(last.session_time - first.session_time)
            }
            _ => None,
        };
        Self { frames, lap_time }
    }

    /// Lap number of the sequence, taken from the first frame.
    pub fn lap_number(&self) -> Option<i32> {
        self.frames.first().map(|f| f.lap_number)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lap_time_derived_from_frames() {
        let mut first = TelemetryFrame::default();
        first.session_time = 10.0;
        let mut last = TelemetryFrame::default();
        last.session_time = 98.5;

        let lap = LapTelemetry::from_frames(vec![first, last]);
        assert_eq!(lap.lap_time, Some(88.5));
    }

    #[test]
    fn single_frame_has_no_lap_time() {
        let lap = LapTelemetry::from_frames(vec![TelemetryFrame::default()]);
        assert_eq!(lap.lap_time, None);
        assert_eq!(lap.len(), 1);
    }
}

//! Event detection for braking zones and corners.

mod braking;
mod corner;

pub use braking::BrakingDetector;
pub use corner::CornerDetector;

use crate::types::TelemetryFrame;

/// Trait for detecting driving events from telemetry frames.
///
/// Each detector is a state machine that processes frames one-by-one,
/// producing a builder when its event closes. The same detector can run
/// over a growing buffer: feed frames as they arrive and call `finalize`
/// once the sequence is known to be complete.
pub trait EventDetector {
    /// The builder type used to accumulate event data during detection.
    type Builder;

    /// Process a single frame, potentially completing an event.
    ///
    /// Returns `Some(builder)` when an event closed on this frame. The
    /// caller finalizes the builder into a result using the full frame
    /// slice and the end index of the detector's closing convention: a
    /// braking zone ends on the release frame itself, a corner on the
    /// last steered frame before it.
    fn process_frame(&mut self, frame: &TelemetryFrame, index: usize) -> Option<Self::Builder>;

    /// Finalize any in-progress event at the end of the sequence.
    fn finalize(&mut self) -> Option<Self::Builder>;

    /// Reset the detector to its initial state before a new lap.
    fn reset(&mut self);
}

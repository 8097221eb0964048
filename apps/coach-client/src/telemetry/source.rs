//! Telemetry source capability.

use coach_core::{SessionDescriptor, TelemetryFrame};

/// Errors a telemetry source can surface.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source has not been connected yet, or lost its connection.
    #[error("telemetry source is not connected")]
    NotConnected,

    /// A replay source ran out of frames; no more data will arrive.
    #[error("end of replay data")]
    EndOfData,

    /// A recoverable failure; the caller may retry with backoff.
    #[error("transient source failure: {0}")]
    Transient(String),
}

/// Capability contract for anything that produces telemetry frames.
///
/// The producer loop drives a source one tick at a time: `freeze_latest`
/// latches the newest sample so that `frame` reads one consistent
/// snapshot. Live simulator bindings and offline replays both implement
/// this trait.
pub trait TelemetrySource: Send {
    /// Establish the connection to the underlying data.
    fn connect(&mut self) -> Result<(), SourceError>;

    /// Whether the source is currently connected.
    fn is_connected(&self) -> bool;

    /// Latch the latest sample for reading.
    fn freeze_latest(&mut self) -> Result<(), SourceError>;

    /// Typed snapshot of the latched sample.
    fn frame(&self) -> Result<TelemetryFrame, SourceError>;

    /// Session metadata derived from the source, once known.
    fn session(&self) -> Option<SessionDescriptor>;

    /// Native sample rate in Hz.
    fn source_hz(&self) -> f64;
}

//! Telemetry sources and the producer loop feeding the bus.

mod collector;
mod replay;
mod source;

pub use collector::{CollectorError, TelemetryCollector};
pub use replay::{ReplayFile, ReplaySource};
pub use source::{SourceError, TelemetrySource};

//! Event handlers wired between the bus and the analysis core.
//!
//! - `LapSegmenter`: buffers frames and emits completed laps
//! - `MetricsHandler`: analyzes completed laps, optionally augmenting with
//!   lateral position
//! - `LogHandler`: samples frames for diagnostic output
//! - `UploadHandler`: forwards laps and metrics to the server

pub mod lap;
pub mod log;
pub mod metrics;
pub mod upload;

pub use lap::{LapSegmenter, LapSegmenterConfig};
pub use log::LogHandler;
pub use metrics::MetricsHandler;
pub use upload::UploadHandler;

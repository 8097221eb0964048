//! Core data types shared across the analysis pipeline.

mod config;
mod frame;
mod lap;
mod session;

pub use config::AnalysisConfig;
pub use frame::TelemetryFrame;
pub use lap::LapTelemetry;
pub use session::{SessionDescriptor, SessionType, TrackType};

//! Telemetry analysis core for the coaching pipeline.
//!
//! Pure, deterministic building blocks shared by the client and any offline
//! tooling:
//!
//! - **types**: telemetry frames, lap sequences, session metadata, thresholds
//! - **detection**: braking-zone and corner state machines
//! - **analysis**: speed statistics, deceleration, trail braking
//! - **metrics**: single-pass lap analysis (`analyze_lap`)
//! - **boundary**: gridded track boundary model and lateral-position solver
//! - **comparison**: distance-matched lap-to-lap deltas
//! - **registry**: thread-safe current-session registry

pub mod analysis;
pub mod boundary;
pub mod comparison;
pub mod detection;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod results;
pub mod types;
pub mod utils;

pub use boundary::{
    augment_with_lateral_position, build_boundary, AugmentedLapTelemetry,
    AugmentedTelemetryFrame, TrackBoundary,
};
pub use comparison::{compare_laps, LapComparison};
pub use error::AnalysisError;
pub use metrics::analyze_lap;
pub use registry::SessionRegistry;
pub use results::{BrakingMetrics, CornerMetrics, LapMetrics};
pub use types::{AnalysisConfig, LapTelemetry, SessionDescriptor, TelemetryFrame};

//! Configuration for the telemetry coach client.
//!
//! Configuration flows from CLI arguments and environment variables (a
//! local `.env` file is honored) into a validated `Config`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use coach_core::AnalysisConfig;
use eventbus::EventBusConfig;
use serde::{Deserialize, Serialize};

/// Telemetry source mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryMode {
    /// Replay from a recorded frame file.
    #[default]
    Replay,
    /// Live simulator connection (provided by an external source binding).
    Live,
}

impl std::str::FromStr for TelemetryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replay" => Ok(TelemetryMode::Replay),
            "live" => Ok(TelemetryMode::Live),
            _ => Err(format!(
                "Invalid telemetry mode: {}. Use 'replay' or 'live'",
                s
            )),
        }
    }
}

impl std::fmt::Display for TelemetryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryMode::Replay => write!(f, "replay"),
            TelemetryMode::Live => write!(f, "live"),
        }
    }
}

/// CLI arguments for the coach client.
#[derive(Parser, Debug, Clone)]
#[command(name = "coach-client")]
#[command(about = "Sim-racing telemetry analysis client")]
#[command(version)]
pub struct CliArgs {
    /// Telemetry mode: 'replay' for a recorded frame file, 'live' for a simulator connection
    #[arg(short, long, env = "TELEMETRY_MODE", default_value = "replay")]
    pub mode: TelemetryMode,

    /// Path to a recorded telemetry frame file (required for replay mode)
    #[arg(short, long, env = "REPLAY_FILE")]
    pub file: Option<PathBuf>,

    /// Playback speed multiplier for replay mode (1.0 = real-time)
    #[arg(short, long, env = "PLAYBACK_SPEED", default_value = "1.0")]
    pub speed: f64,

    /// Loop the replay when it reaches the end
    #[arg(long, env = "REPLAY_LOOP", default_value = "false")]
    pub replay_loop: bool,

    /// Server URL for upload endpoints
    #[arg(long, env = "SERVER_URL", default_value = "http://localhost:8000")]
    pub server_url: String,

    /// Enable lap and metrics upload to the server
    #[arg(long, env = "UPLOAD_ENABLED", default_value = "false")]
    pub upload: bool,

    /// Directory of stored track boundary files
    #[arg(long, env = "BOUNDARY_DIR")]
    pub boundary_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log every N-th telemetry frame
    #[arg(long, env = "LOG_FREQUENCY", default_value = "60")]
    pub log_frequency: usize,

    /// Minimum lap completion fraction for a valid lap change (0.0-1.0)
    #[arg(long, env = "LAP_COMPLETION_THRESHOLD", default_value = "0.95")]
    pub lap_completion_threshold: f64,

    /// Minimum brake input to enter the braking state (0.0-1.0)
    #[arg(long, env = "BRAKE_THRESHOLD", default_value = "0.05")]
    pub brake_threshold: f64,

    /// Minimum steering magnitude to enter the cornering state (radians)
    #[arg(long, env = "STEERING_THRESHOLD", default_value = "0.15")]
    pub steering_threshold: f64,

    /// Minimum throttle for throttle-application detection (0.0-1.0)
    #[arg(long, env = "THROTTLE_THRESHOLD", default_value = "0.05")]
    pub throttle_threshold: f64,

    /// Reject corners shorter than this (seconds)
    #[arg(long, env = "MIN_CORNER_DURATION", default_value = "0.30")]
    pub min_corner_duration: f64,

    /// Reject braking zones shorter than this (seconds)
    #[arg(long, env = "MIN_BRAKING_DURATION", default_value = "0.10")]
    pub min_braking_duration: f64,

    /// Event bus queue capacity
    #[arg(long, env = "BUS_QUEUE_MAX", default_value = "1000")]
    pub bus_queue_max: usize,

    /// Event bus worker pool size (0 = number of cores)
    #[arg(long, env = "BUS_WORKERS", default_value = "0")]
    pub bus_workers: usize,

    /// Shutdown drain budget in seconds
    #[arg(long, env = "STOP_GRACE_SECS", default_value = "5")]
    pub stop_grace_secs: u64,
}

impl CliArgs {
    /// Validate the argument combination.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == TelemetryMode::Replay && self.file.is_none() {
            return Err(ConfigError::MissingReplayFile);
        }

        if self.speed <= 0.0 {
            return Err(ConfigError::InvalidPlaybackSpeed(self.speed));
        }

        if !(0.0..=1.0).contains(&self.lap_completion_threshold) {
            return Err(ConfigError::InvalidThreshold(self.lap_completion_threshold));
        }

        if let Some(ref path) = self.file {
            if self.mode == TelemetryMode::Replay && !path.exists() {
                return Err(ConfigError::ReplayFileNotFound(path.clone()));
            }
        }

        Ok(())
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: TelemetryMode,
    pub replay_file: Option<PathBuf>,
    pub playback_speed: f64,
    pub replay_loop: bool,
    pub server_url: String,
    pub upload_enabled: bool,
    pub boundary_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_frequency: usize,
    pub lap_completion_threshold: f64,
    pub analysis: AnalysisConfig,
    pub bus_queue_max: usize,
    pub bus_workers: usize,
    pub stop_grace: Duration,
}

impl Config {
    /// Create configuration from parsed CLI arguments.
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        args.validate()?;

        Ok(Self {
            mode: args.mode,
            replay_file: args.file,
            playback_speed: args.speed,
            replay_loop: args.replay_loop,
            server_url: args.server_url,
            upload_enabled: args.upload,
            boundary_dir: args.boundary_dir,
            log_level: args.log_level,
            log_frequency: args.log_frequency.max(1),
            lap_completion_threshold: args.lap_completion_threshold,
            analysis: AnalysisConfig {
                brake_threshold: args.brake_threshold,
                steering_threshold: args.steering_threshold,
                throttle_threshold: args.throttle_threshold,
                min_corner_duration: args.min_corner_duration,
                min_braking_duration: args.min_braking_duration,
            },
            bus_queue_max: args.bus_queue_max,
            bus_workers: args.bus_workers,
            stop_grace: Duration::from_secs(args.stop_grace_secs),
        })
    }

    /// Load configuration from environment and CLI.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_args(CliArgs::parse())
    }

    /// Event bus configuration derived from this config.
    pub fn bus_config(&self) -> EventBusConfig {
        let defaults = EventBusConfig::default();
        EventBusConfig {
            queue_capacity: self.bus_queue_max,
            workers: if self.bus_workers == 0 {
                defaults.workers
            } else {
                self.bus_workers
            },
            stop_grace: self.stop_grace,
        }
    }

    /// Base URL for lap telemetry endpoints.
    pub fn laps_api_url(&self) -> String {
        format!("{}/api/v1/laps", self.server_url)
    }

    /// Base URL for metrics endpoints.
    pub fn metrics_api_url(&self) -> String {
        format!("{}/api/v1/metrics", self.server_url)
    }

    /// Health check URL.
    pub fn health_url(&self) -> String {
        format!("{}/api/v1/health", self.server_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: TelemetryMode::Replay,
            replay_file: None,
            playback_speed: 1.0,
            replay_loop: false,
            server_url: "http://localhost:8000".to_string(),
            upload_enabled: false,
            boundary_dir: None,
            log_level: "info".to_string(),
            log_frequency: 60,
            lap_completion_threshold: 0.95,
            analysis: AnalysisConfig::default(),
            bus_queue_max: 1000,
            bus_workers: 0,
            stop_grace: Duration::from_secs(5),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("replay file path is required for replay mode")]
    MissingReplayFile,

    #[error("replay file not found: {0}")]
    ReplayFileNotFound(PathBuf),

    #[error("invalid playback speed: {0}. Must be positive")]
    InvalidPlaybackSpeed(f64),

    #[error("invalid lap completion threshold: {0}. Must be between 0.0 and 1.0")]
    InvalidThreshold(f64),
}

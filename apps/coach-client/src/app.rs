//! Application orchestrator: wires the bus, handlers, and producer.

use std::sync::Arc;

use anyhow::Context;
use coach_core::SessionRegistry;
use eventbus::{EventBus, EventHandler};
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::CoachApiClient;
use crate::config::{Config, TelemetryMode};
use crate::events::{CoachEvent, CoachEventKind};
use crate::handlers::{LapSegmenter, LapSegmenterConfig, LogHandler, MetricsHandler, UploadHandler};
use crate::telemetry::{ReplaySource, TelemetryCollector, TelemetrySource};
use crate::track::{FileBoundaryStore, TrackBoundaryStore};

/// Coach client application.
pub struct CoachApp {
    config: Config,
    bus: EventBus<CoachEvent>,
    registry: Arc<SessionRegistry>,
    api_client: Arc<CoachApiClient>,
}

impl CoachApp {
    pub fn new(config: Config) -> Self {
        let bus = EventBus::with_config(config.bus_config());
        let registry = Arc::new(SessionRegistry::new());
        let api_client = Arc::new(CoachApiClient::new(&config.server_url));

        Self {
            config,
            bus,
            registry,
            api_client,
        }
    }

    /// Run the pipeline until the source is exhausted or the user
    /// interrupts.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting telemetry coach client");
        info!("Mode: {}", self.config.mode);
        if let Some(ref file) = self.config.replay_file {
            info!("Replay file: {}", file.display());
        }
        info!("Server: {}", self.config.server_url);
        info!("Upload enabled: {}", self.config.upload_enabled);

        if self.config.upload_enabled {
            self.check_server_health().await;
        }

        self.register_handlers();
        self.bus.start();

        let source = self.create_source()?;
        let collector = TelemetryCollector::new(self.registry.clone());
        let collector_cancel = collector.cancel_token();

        let publisher = self.bus.publisher();
        let collector_handle = tokio::spawn(async move {
            if let Err(err) = collector.run(source, publisher).await {
                error!("Collector error: {err}");
            }
        });

        let shutdown_reason = tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                "user interrupt"
            }
            result = collector_handle => {
                match result {
                    Ok(()) => "collection complete",
                    Err(err) => {
                        error!("Collector task panicked: {err}");
                        "collector panic"
                    }
                }
            }
        };

        info!("Initiating shutdown (reason: {shutdown_reason})");
        collector_cancel.cancel();
        self.bus.stop().await;

        info!("Telemetry coach client shutdown complete");
        Ok(())
    }

    /// Build the telemetry source for the configured mode.
    fn create_source(&self) -> anyhow::Result<Box<dyn TelemetrySource>> {
        match self.config.mode {
            TelemetryMode::Replay => {
                let path = self
                    .config
                    .replay_file
                    .as_ref()
                    .context("replay mode requires a frame file")?;
                let source = ReplaySource::from_file(path)
                    .with_context(|| format!("opening replay file {}", path.display()))?
                    .with_speed_multiplier(self.config.playback_speed)
                    .with_loop(self.config.replay_loop);
                Ok(Box::new(source))
            }
            TelemetryMode::Live => anyhow::bail!(
                "live mode requires a simulator source binding; this build supports replay only"
            ),
        }
    }

    /// Subscribe every handler to its event kinds.
    fn register_handlers(&self) {
        let segmenter: Arc<dyn EventHandler<CoachEvent>> =
            Arc::new(LapSegmenter::with_config(LapSegmenterConfig {
                lap_completion_threshold: self.config.lap_completion_threshold,
            }));
        self.bus
            .subscribe(CoachEventKind::TelemetryFrame, segmenter.clone());
        self.bus
            .subscribe(CoachEventKind::SessionStart, segmenter.clone());
        self.bus.subscribe(CoachEventKind::SessionEnd, segmenter);

        let mut metrics = MetricsHandler::new(self.config.analysis);
        if let Some(ref dir) = self.config.boundary_dir {
            let store: Arc<dyn TrackBoundaryStore> = Arc::new(FileBoundaryStore::new(dir));
            let known = store.list_boundaries().len();
            info!("Boundary store at {} ({} tracks)", dir.display(), known);
            metrics = metrics.with_boundary_store(store);
        }
        self.bus
            .subscribe(CoachEventKind::LapCompleted, Arc::new(metrics));

        let logger: Arc<dyn EventHandler<CoachEvent>> = Arc::new(LogHandler::new(
            self.config.log_frequency,
            self.registry.clone(),
        ));
        self.bus
            .subscribe(CoachEventKind::TelemetryFrame, logger.clone());
        self.bus.subscribe(CoachEventKind::SessionEnd, logger);

        if self.config.upload_enabled {
            let uploader: Arc<dyn EventHandler<CoachEvent>> =
                Arc::new(UploadHandler::new(self.api_client.clone()));
            self.bus
                .subscribe(CoachEventKind::LapCompleted, uploader.clone());
            self.bus
                .subscribe(CoachEventKind::LapMetricsExtracted, uploader);
        } else {
            info!("Upload handler disabled");
        }
    }

    /// Probe the server before starting; uploads may fail if it is down.
    async fn check_server_health(&self) {
        match self.api_client.health_check().await {
            Ok(response) => info!("Server is healthy: {}", response.status),
            Err(err) => warn!("Server health check failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn live_mode_is_not_supported_in_this_build() {
        let config = Config {
            mode: TelemetryMode::Live,
            ..Default::default()
        };
        let app = CoachApp::new(config);
        assert!(app.create_source().is_err());
    }

    #[tokio::test]
    async fn replay_mode_requires_a_file() {
        let app = CoachApp::new(Config::default());
        assert!(app.create_source().is_err());
    }
}

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use coach_client::{CoachApp, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    info!("Telemetry Coach Client v{}", env!("CARGO_PKG_VERSION"));

    CoachApp::new(config).run().await
}

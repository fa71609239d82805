//! Planwright Server
//!
//! Standalone binary; `planwright serve` starts the same server.

use planwright_core::PlanwrightConfig;
use planwright_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let app = PlanwrightConfig::load()?;
    start_server(ServerConfig { app }).await
}

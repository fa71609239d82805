//! `planwright serve` - start the HTTP API

use anyhow::Result;

use planwright_core::PlanwrightConfig;
use planwright_server::ServerConfig;

/// Run the serve command.
pub async fn run(config: PlanwrightConfig, port: Option<u16>) -> Result<()> {
    let mut server = ServerConfig { app: config };
    if let Some(port) = port {
        server = server.with_port(port);
    }

    print_banner(&server);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = planwright_server::start_server(server) => result?,
        _ = shutdown_signal => println!("\n  Shutting down..."),
    }

    Ok(())
}

fn print_banner(server: &ServerConfig) {
    println!();
    println!("  \x1b[1;36mPlanwright\x1b[0m server starting");
    println!("  ─────────────────────────────────────");
    println!("  Local:    http://localhost:{}", server.app.port);
    println!("  Database: {}", server.app.db_path.display());
    if server.app.api_key.is_none() {
        println!("  \x1b[33m!\x1b[0m Set ANTHROPIC_API_KEY to enable plan generation");
    }
    println!();
}

//! Planwright Server
//!
//! HTTP API for generating business plans and reading them back.
//! This is a library crate; the server is started via `start_server()`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::Method, routing::get, Json, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use planwright_core::agent::GenerationSettings;
use planwright_core::ai::{AiClient, AiClientConfig, TextGenerator};
use planwright_core::storage::Database;
use planwright_core::PlanwrightConfig;

pub mod error;
pub mod routes;
pub mod types;

use types::HealthResponse;

/// Configuration for starting the server.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Resolved application config; `app.port` is the listen port.
    pub app: PlanwrightConfig,
}

impl ServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.app.port = port;
        self
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// SQLite database path (opened per request).
    pub db_path: Arc<PathBuf>,
    /// Text generator (None when no API key is configured).
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub settings: GenerationSettings,
    /// Wall-clock budget for one generation request.
    pub run_timeout: Duration,
}

impl AppState {
    pub fn new(config: &PlanwrightConfig, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            db_path: Arc::new(config.db_path.clone()),
            generator,
            settings: GenerationSettings::from(config),
            run_timeout: config.run_timeout,
        }
    }
}

/// Build the generation client from config, if an API key is available.
pub fn create_ai_client(config: &PlanwrightConfig) -> Option<AiClient> {
    let api_key = match config.api_key.clone() {
        Some(key) => key,
        None => {
            tracing::warn!("No ANTHROPIC_API_KEY configured; plan generation will be unavailable");
            return None;
        }
    };

    Some(AiClient::new(AiClientConfig::from_app_config(config), api_key))
}

/// Assemble the router around an existing state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .nest("/api", routes::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the Axum router with all routes.
pub fn build_router(config: &ServerConfig) -> anyhow::Result<(Router, AppState)> {
    // Create the file and run migrations up front
    let _db = Database::new(&config.app.db_path)?;

    let generator =
        create_ai_client(&config.app).map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
    let state = AppState::new(&config.app, generator);

    Ok((router(state.clone()), state))
}

/// Start the Planwright server and block until shutdown.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.app.port).parse()?;
    let (app, _state) = build_router(&config)?;

    tracing::info!(
        db = %config.app.db_path.display(),
        model = %config.app.model,
        "Planwright server listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: HashMap::from([("generate".to_string(), state.generator.is_some())]),
    })
}

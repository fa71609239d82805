//! API routes

use axum::Router;

use crate::AppState;

mod plans;

/// Build the API router with all endpoints
pub fn api_router() -> Router<AppState> {
    Router::new().nest("/plans", plans::router())
}

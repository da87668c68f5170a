//! Central module for organizing the application's HTTP endpoints.
//!
//! The team functions live under `/functions/v1`, next to the smaller team
//! and invitation APIs used by the web client.

pub mod common;
pub mod functions;
pub mod invitation;
pub mod team;

use crate::services::context::AppContext;
use axum::{Extension, Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// Builds the full application router around a shared context.
pub fn app_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/functions/v1", functions::routes::functions_router())
        .nest("/api/teams", team::routes::team_router())
        .nest("/api/invitations", invitation::routes::invitation_router())
        .layer(Extension(ctx))
        .layer(TraceLayer::new_for_http())
        .layer(common::cors_layer())
}

async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "CollabMate Team Functions",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

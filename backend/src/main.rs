//! Main entry point for the CollabMate team functions backend.
//!
//! This file initializes the Axum web server, sets up the storage backend,
//! and registers all API routes and middleware.
//! It orchestrates the application's startup and defines its overall structure.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
#[cfg(test)]
mod testing;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use config::{Config, StorageBackend};
use database::Database;
use repositories::in_memory::InMemoryStore;
use services::context::AppContext;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let (ctx, database) = match config.storage_backend {
        StorageBackend::Sqlite => {
            let db = Database::new(&config).await?;
            db.migrate().await?;
            let ctx = AppContext::with_sqlite(db.pool().clone(), &config)?;
            (ctx, Some(db))
        }
        StorageBackend::Memory => {
            let store = Arc::new(InMemoryStore::new());
            let (admin, team) = store.seed_demo().await;
            info!(
                "Using in-memory storage. Demo admin {} ({}) owns team {}",
                admin.email, admin.id, team.id
            );
            (AppContext::with_memory(store, &config)?, None)
        }
    };

    let app = api::app_router(ctx);

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Starting CollabMate server on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

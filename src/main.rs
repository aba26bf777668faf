// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feedback Square server
//!
//! Serves the feedback board over HTTP, backed by a local SQLite file.

use anyhow::Context;
use feedback_square::{config::Config, db::SqliteDb, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        oauth_enabled = config.oauth.is_enabled(),
        "Starting Feedback Square"
    );

    // Open the store and create tables
    let db = SqliteDb::open(&config.database_path)
        .await
        .context("failed to open database")?;
    db.ensure_schema()
        .await
        .context("failed to create database schema")?;
    tracing::info!(path = %config.database_path, "Database ready");

    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config, db)?);
    let app = feedback_square::routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    tracing::info!(address = %listen_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging. `RUST_LOG` overrides the default filter.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feedback_square=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod pages;

use crate::error::AppError;
use crate::middleware::{load_session, require_login};
use crate::services::SessionClaims;
use crate::views::Nav;
use crate::AppState;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

const APP_CSS: &str = include_str!("../../static/app.css");

/// Liveness probe
async fn health_check() -> &'static str {
    "ok"
}

async fn stylesheet() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        APP_CSS,
    )
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Navigation details for the caller. A failed user lookup shows no name.
pub(crate) async fn viewer_nav(state: &AppState, session: &SessionClaims) -> Nav {
    let user_name = match session.user_id() {
        Some(user_id) => match state.db.get_user(user_id).await {
            Ok(user) => user.map(|u| u.display_name),
            Err(e) => {
                tracing::warn!(error = %e, user_id, "Viewer lookup failed");
                None
            }
        },
        None => None,
    };

    Nav {
        user_name,
        logged_in: session.user_id().is_some(),
        is_admin: session.is_admin,
    }
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/static/app.css", get(stylesheet))
        .merge(pages::routes())
        .merge(auth::routes())
        .merge(admin::routes());

    // Pages that need a user identity
    let login_routes = pages::login_routes().route_layer(middleware::from_fn(require_login));

    Router::new()
        .merge(public_routes)
        .merge(login_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth login, callback and logout routes.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::OAUTH_CALLBACK_PATH;
use crate::error::{AppError, Result};
use crate::services::session::{http_only_cookie, removal_cookie};
use crate::services::{token, SessionClaims};
use crate::AppState;

/// Cookie holding the anti-forgery state between `/login` and the callback.
pub const OAUTH_STATE_COOKIE: &str = "fs_oauth_state";

/// How long a login attempt may take at the provider.
const OAUTH_STATE_TTL: time::Duration = time::Duration::minutes(10);

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route(OAUTH_CALLBACK_PATH, get(oauth_callback))
        .route("/logout", get(logout))
}

/// Start OAuth flow - redirect to the provider's authorization page.
async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    state.config.validate_oauth()?;

    let oauth_state = token::new_state_token()?;
    let cookie = http_only_cookie(
        OAUTH_STATE_COOKIE,
        oauth_state.clone(),
        state.config.base_url_is_tls(),
        OAUTH_STATE_TTL,
    );

    tracing::info!("Starting OAuth flow, redirecting to provider");
    Ok((
        jar.add(cookie),
        Redirect::temporary(&state.oauth.authorize_url(&oauth_state)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, resolve user, create session.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    jar: CookieJar,
    query: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    if let Err(e) = state.config.validate_oauth() {
        return AppError::from(e).into_response();
    }

    // The state cookie is single-use whatever the outcome.
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(removal_cookie(
        OAUTH_STATE_COOKIE,
        state.config.base_url_is_tls(),
    ));

    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed OAuth callback query");
            return (jar, AppError::BadRequest("invalid callback parameters".to_string()))
                .into_response();
        }
    };

    match complete_login(&state, &session, params, expected_state).await {
        Ok(session_cookie) => (jar.add(session_cookie), Redirect::to("/")).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn complete_login(
    state: &AppState,
    session: &SessionClaims,
    params: CallbackParams,
    expected_state: Option<String>,
) -> Result<Cookie<'static>> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from provider");
        return Err(AppError::BadRequest(format!("authorization failed: {}", error)));
    }

    let code = non_blank(params.code)
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;
    let returned_state = non_blank(params.state)
        .ok_or_else(|| AppError::BadRequest("missing state parameter".to_string()))?;
    let expected_state = expected_state
        .ok_or_else(|| AppError::BadRequest("login session expired, please retry".to_string()))?;

    if !bool::from(expected_state.as_bytes().ct_eq(returned_state.as_bytes())) {
        tracing::warn!("OAuth state mismatch");
        return Err(AppError::BadRequest("login state mismatch".to_string()));
    }

    tracing::info!("Exchanging authorization code for tokens");
    let access_token = state.oauth.exchange_code(&code).await?;
    let identity = state.oauth.fetch_identity(&access_token).await?;
    let user_id = state.db.upsert_user_by_external_id(&identity).await?;

    tracing::info!(
        user_id = %user_id,
        external_id = %identity.external_id,
        "OAuth successful, user resolved"
    );

    // Admin elevation survives logging in.
    let claims = SessionClaims::for_user(user_id, session.is_admin);
    Ok(state.sessions.issue_cookie(&claims)?)
}

/// Drop the session cookie. Nothing server-side to revoke.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.add(state.sessions.removal_cookie()), Redirect::to("/"))
}

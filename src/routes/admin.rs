// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin elevation and replies.

use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Extension, Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use validator::Validate;

use super::viewer_nav;
use crate::error::{AppError, Result};
use crate::models::NewReply;
use crate::services::{can_view, SessionClaims};
use crate::views::{self, AdminNotice};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(admin_form).post(elevate))
        .route("/square/{id}/reply", post(create_reply))
}

#[derive(Debug, Deserialize)]
pub struct AdminParams {
    #[serde(default)]
    ok: Option<String>,
    #[serde(default)]
    bad: Option<String>,
}

async fn admin_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    Query(params): Query<AdminParams>,
) -> Html<String> {
    let notice = if params.ok.is_some() {
        AdminNotice::Elevated
    } else if params.bad.is_some() {
        AdminNotice::Rejected
    } else {
        AdminNotice::None
    };
    let nav = viewer_nav(&state, &session).await;

    Html(views::admin_page(&nav, notice))
}

#[derive(Debug, Deserialize)]
pub struct AdminForm {
    #[serde(default)]
    key: Option<String>,
}

/// Whether `provided` matches the configured passphrase. Never matches
/// when no passphrase is configured.
fn passphrase_matches(configured: Option<&str>, provided: &str) -> bool {
    match configured {
        Some(expected) if !provided.is_empty() => {
            bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
        }
        _ => false,
    }
}

async fn elevate(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    jar: CookieJar,
    form: std::result::Result<Form<AdminForm>, FormRejection>,
) -> Result<(CookieJar, Redirect)> {
    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let provided = form.key.as_deref().map(str::trim).unwrap_or_default();

    if !passphrase_matches(state.config.admin_key.as_deref(), provided) {
        tracing::warn!("Rejected admin passphrase");
        return Ok((jar, Redirect::to("/admin?bad=1")));
    }

    let claims = SessionClaims::elevated(session.user_id.clone());
    let cookie = state.sessions.issue_cookie(&claims)?;
    tracing::info!(user_id = ?session.user_id, "Session elevated to admin");

    Ok((jar.add(cookie), Redirect::to("/admin?ok=1")))
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    content: Option<String>,
}

async fn create_reply(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    Path(id): Path<String>,
    form: std::result::Result<Form<ReplyForm>, FormRejection>,
) -> Result<Redirect> {
    // Same answer as for a missing item.
    if !session.is_admin {
        return Err(AppError::NotFound);
    }

    let item = state
        .db
        .get_feedback(&id)
        .await?
        .filter(|item| can_view(&session, item))
        .ok_or(AppError::NotFound)?;

    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let reply = NewReply::from_form(form.content.as_deref().unwrap_or_default());
    let thread = format!("/square/{}", item.id);
    let retry = format!("{}?reply_error=1", thread);

    if let Err(e) = reply.validate() {
        tracing::debug!(error = %e, feedback_id = %item.id, "Invalid reply");
        return Ok(Redirect::to(&retry));
    }

    match state
        .db
        .insert_reply(&item.id, session.user_id(), &reply)
        .await
    {
        Ok(_) => Ok(Redirect::to(&thread)),
        Err(e) => {
            tracing::error!(error = %e, feedback_id = %item.id, "Failed to store reply");
            Ok(Redirect::to(&retry))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passphrase_matches() {
        assert!(passphrase_matches(Some("hunter2"), "hunter2"));
        assert!(!passphrase_matches(Some("hunter2"), "hunter3"));
        assert!(!passphrase_matches(Some("hunter2"), "hunter"));
        assert!(!passphrase_matches(Some("hunter2"), ""));
        assert!(!passphrase_matches(None, "hunter2"));
        assert!(!passphrase_matches(None, ""));
    }
}

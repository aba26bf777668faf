// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feedback pages: home, public square, item detail, new item, own items.

use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::viewer_nav;
use crate::error::{AppError, Result};
use crate::models::NewFeedback;
use crate::services::{can_view, SessionClaims};
use crate::views;
use crate::AppState;

/// Pages open to everyone.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/square", get(square))
        .route("/square/{id}", get(detail))
}

/// Pages for logged-in users; the caller adds the login gate.
pub fn login_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/new", get(new_form).post(create_feedback))
        .route("/me", get(my_feedback))
}

async fn home(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
) -> Result<Html<String>> {
    let count = state.db.count_public_feedback().await?;
    let nav = viewer_nav(&state, &session).await;

    Ok(Html(views::home_page(&nav, count)))
}

#[derive(Debug, Deserialize)]
pub struct SquareParams {
    #[serde(default)]
    q: Option<String>,
}

async fn square(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    Query(params): Query<SquareParams>,
) -> Result<Html<String>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    let search = Some(query).filter(|q| !q.is_empty());

    let items = state.db.list_public_feedback(search).await?;
    let nav = viewer_nav(&state, &session).await;

    Ok(Html(views::square_page(&nav, query, &items)))
}

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    #[serde(default)]
    reply_error: Option<String>,
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Result<Html<String>> {
    // Hidden items are indistinguishable from missing ones.
    let item = state
        .db
        .get_feedback(&id)
        .await?
        .filter(|item| can_view(&session, item))
        .ok_or(AppError::NotFound)?;

    let replies = state.db.list_replies(&item.id).await?;
    let nav = viewer_nav(&state, &session).await;
    let reply_error = params.reply_error.as_deref() == Some("1");

    Ok(Html(views::detail_page(&nav, &item, &replies, reply_error)))
}

#[derive(Debug, Deserialize)]
pub struct NewParams {
    #[serde(default)]
    error: Option<String>,
}

async fn new_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    Query(params): Query<NewParams>,
) -> Html<String> {
    let nav = viewer_nav(&state, &session).await;
    Html(views::new_page(&nav, params.error.as_deref() == Some("1")))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    is_public: Option<String>,
}

async fn create_feedback(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
    form: std::result::Result<Form<FeedbackForm>, FormRejection>,
) -> Result<Response> {
    let Some(user_id) = session.user_id() else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let feedback = NewFeedback::from_form(
        form.title.as_deref().unwrap_or_default(),
        form.content.as_deref().unwrap_or_default(),
        form.is_public.as_deref(),
    );
    feedback
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    match state.db.insert_feedback(user_id, &feedback).await {
        Ok(id) => Ok(Redirect::to(&format!("/square/{}", id)).into_response()),
        Err(e) => {
            // Send the user back to the form rather than an error page.
            tracing::error!(error = %e, user_id, "Failed to store feedback");
            Ok(Redirect::to("/new?error=1").into_response())
        }
    }
}

async fn my_feedback(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionClaims>,
) -> Result<Response> {
    let Some(user_id) = session.user_id() else {
        return Ok(Redirect::to("/login").into_response());
    };

    let items = state.db.list_feedback_for_user(user_id).await?;
    let nav = viewer_nav(&state, &session).await;

    Ok(Html(views::me_page(&nav, &items)).into_response())
}

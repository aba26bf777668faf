// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie decoding.

use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Decode the session cookie and store the claims as a request extension.
///
/// Never rejects: a missing or unverifiable cookie yields the anonymous
/// session.
pub async fn load_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = state.sessions.claims_from_jar(&jar);
    request.extensions_mut().insert(claims);

    next.run(request).await
}

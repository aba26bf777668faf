// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login gate for pages that need a user identity.

use crate::services::SessionClaims;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Middleware that sends callers without a user identity to `/login`.
///
/// Must run after [`crate::middleware::load_session`]. An admin-only
/// session has no identity and is redirected as well.
pub async fn require_login(request: Request, next: Next) -> Response {
    let logged_in = request
        .extensions()
        .get::<SessionClaims>()
        .is_some_and(|claims| claims.user_id().is_some());

    if !logged_in {
        return Redirect::to("/login").into_response();
    }

    next.run(request).await
}

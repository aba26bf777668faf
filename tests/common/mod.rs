// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing,
    Json, Router,
};
use feedback_square::config::{Config, OAuthSettings};
use feedback_square::db::SqliteDb;
use feedback_square::routes::create_router;
use feedback_square::services::session::SESSION_COOKIE;
use feedback_square::services::{ProviderIdentity, SessionClaims};
use feedback_square::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Access token handed out by the fake provider.
#[allow(dead_code)]
pub const FAKE_ACCESS_TOKEN: &str = "fake-access-token";

/// Create a test app with the default test config and an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let db = SqliteDb::open_in_memory()
        .await
        .expect("Failed to open in-memory database");
    db.ensure_schema().await.expect("Failed to create schema");

    let state = Arc::new(AppState::new(config, db).expect("Failed to build state"));
    (create_router(state.clone()), state)
}

/// Insert (or refresh) a user and return the internal id.
#[allow(dead_code)]
pub async fn create_user(state: &AppState, external_id: &str, name: &str) -> String {
    state
        .db
        .upsert_user_by_external_id(&ProviderIdentity {
            external_id: external_id.to_string(),
            display_name: name.to_string(),
            avatar_url: None,
        })
        .await
        .expect("Failed to create user")
}

/// `Cookie` header value carrying the given claims.
#[allow(dead_code)]
pub fn session_cookie(state: &AppState, claims: &SessionClaims) -> String {
    let value = state
        .sessions
        .encode(claims, chrono::Utc::now().timestamp())
        .expect("Failed to encode session");
    format!("{}={}", SESSION_COOKIE, value)
}

#[allow(dead_code)]
pub fn user_cookie(state: &AppState, user_id: &str) -> String {
    session_cookie(state, &SessionClaims::for_user(user_id, false))
}

#[allow(dead_code)]
pub fn admin_cookie(state: &AppState, user_id: Option<&str>) -> String {
    session_cookie(state, &SessionClaims::elevated(user_id.map(str::to_string)))
}

/// URL-encoded form body.
#[allow(dead_code)]
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn post_form(
    app: &Router,
    uri: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::from(form_body(fields))).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Full `Set-Cookie` header for `name`, if the response sets it.
#[allow(dead_code)]
pub fn find_cookie(response: &Response, name: &str) -> Option<String> {
    set_cookie_headers(response)
        .into_iter()
        .find(|value| value.starts_with(&format!("{name}=")))
}

/// `name=value` part of a `Set-Cookie` header.
#[allow(dead_code)]
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[allow(dead_code)]
pub async fn count_rows(state: &AppState, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(state.db.pool())
        .await
        .unwrap()
}

// ─── Fake OAuth provider ─────────────────────────────────────────

#[derive(Clone)]
struct ProviderState {
    profile: Arc<Mutex<Value>>,
    token_calls: Arc<AtomicUsize>,
}

/// Local stand-in for the identity provider.
#[allow(dead_code)]
pub struct FakeProvider {
    pub base_url: String,
    profile: Arc<Mutex<Value>>,
    token_calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeProvider {
    /// Replace the profile returned by the userinfo endpoint.
    pub fn set_profile(&self, profile: Value) {
        *self.profile.lock().unwrap() = profile;
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> OAuthSettings {
        OAuthSettings {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            auth_url: format!("{}/authorize", self.base_url),
            token_url: format!("{}/token", self.base_url),
            userinfo_url: format!("{}/userinfo", self.base_url),
        }
    }

    /// Test config pointing at this provider.
    pub fn config(&self) -> Config {
        let mut config = Config::test_default();
        config.oauth = self.settings();
        config
    }
}

async fn fake_token(State(provider): State<ProviderState>, body: String) -> Response {
    provider.token_calls.fetch_add(1, Ordering::SeqCst);

    if !body.contains("grant_type=authorization_code") || !body.contains("code=") {
        return (StatusCode::BAD_REQUEST, "bad grant").into_response();
    }
    if body.contains("code=bad-code") {
        return (StatusCode::UNAUTHORIZED, "invalid code").into_response();
    }
    if body.contains("code=no-token") {
        return Json(json!({})).into_response();
    }
    if body.contains("code=blank-token") {
        return Json(json!({ "access_token": "  " })).into_response();
    }

    Json(json!({ "access_token": FAKE_ACCESS_TOKEN, "token_type": "bearer" })).into_response()
}

async fn fake_userinfo(State(provider): State<ProviderState>, headers: HeaderMap) -> Response {
    let expected = format!("Bearer {}", FAKE_ACCESS_TOKEN);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == expected);

    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let profile = provider.profile.lock().unwrap().clone();
    Json(profile).into_response()
}

/// Start a fake provider on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_fake_provider(profile: Value) -> FakeProvider {
    let profile = Arc::new(Mutex::new(profile));
    let token_calls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/token", routing::post(fake_token))
        .route("/userinfo", routing::get(fake_userinfo))
        .with_state(ProviderState {
            profile: profile.clone(),
            token_calls: token_calls.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake provider");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeProvider {
        base_url: format!("http://{}", addr),
        profile,
        token_calls,
    }
}

/// Run `/login` then the callback with the issued state.
/// `extra_cookie` is sent along with the state cookie (e.g. an existing session).
#[allow(dead_code)]
pub async fn login_via_provider(app: &Router, extra_cookie: Option<&str>) -> Response {
    let response = get(app, "/login", extra_cookie).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let state_cookie = cookie_pair(
        &find_cookie(&response, "fs_oauth_state").expect("missing state cookie"),
    );
    let state_value = state_cookie
        .split_once('=')
        .map(|(_, v)| v.to_string())
        .unwrap();

    let cookie = match extra_cookie {
        Some(extra) => format!("{}; {}", state_cookie, extra),
        None => state_cookie,
    };
    get(
        app,
        &format!("/linux?code=good-code&state={}", state_value),
        Some(&cookie),
    )
    .await
}

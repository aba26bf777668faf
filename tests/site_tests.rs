// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Site-wide behavior: logout cookie, cookie flags, headers, static routes.

use axum::http::{header, StatusCode};
use feedback_square::config::Config;
use feedback_square::services::session::SESSION_COOKIE;

mod common;

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::create_user(&state, "ext-1", "alice").await;
    let cookie = common::user_cookie(&state, &user_id);

    let response = common::get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/");

    let cleared = common::find_cookie(&response, SESSION_COOKIE).unwrap();
    assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE)));
    assert!(cleared.contains("Max-Age=0"));
    assert!(cleared.contains("Path=/"));
    assert!(cleared.contains("HttpOnly"));
    assert!(cleared.contains("SameSite=Lax"));
    assert!(!cleared.contains("Secure"));

    // Works without any session, too.
    let response = common::get(&app, "/logout", None).await;
    assert!(common::find_cookie(&response, SESSION_COOKIE).is_some());
}

#[tokio::test]
async fn test_secure_flag_follows_base_url() {
    let mut config = Config::test_default();
    config.base_url = "https://feedback.example.com".to_string();
    let (app, _) = common::create_test_app_with_config(config).await;

    let response = common::post_form(&app, "/admin", None, &[("key", "test_admin_key")]).await;
    let issued = common::find_cookie(&response, SESSION_COOKIE).unwrap();
    assert!(issued.contains("Secure"));
    assert!(issued.contains("HttpOnly"));
    assert!(issued.contains("SameSite=Lax"));
    assert!(issued.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));

    let response = common::get(&app, "/logout", None).await;
    let cleared = common::find_cookie(&response, SESSION_COOKIE).unwrap();
    assert!(cleared.contains("Secure"));
}

#[tokio::test]
async fn test_security_headers_on_pages_and_errors() {
    let (app, _) = common::create_test_app().await;

    for uri in ["/", "/square", "/nope"] {
        let response = common::get(&app, uri, None).await;
        let headers = response.headers();
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(headers.get("Referrer-Policy").unwrap(), "same-origin");
        assert!(headers.get("Content-Security-Policy").is_some());
    }
}

#[tokio::test]
async fn test_unknown_path_is_404_page() {
    let (app, _) = common::create_test_app().await;

    let response = common::get(&app, "/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn test_health_and_stylesheet() {
    let (app, _) = common::create_test_app().await;

    let response = common::get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_text(response).await, "ok");

    let response = common::get(&app, "/static/app.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css; charset=utf-8"
    );
    assert!(!common::body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_nav_shows_viewer() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::create_user(&state, "ext-1", "carol").await;

    let body = common::body_text(common::get(&app, "/", None).await).await;
    assert!(body.contains("href=\"/login\""));
    assert!(!body.contains("carol"));

    let cookie = common::user_cookie(&state, &user_id);
    let body = common::body_text(common::get(&app, "/", Some(&cookie)).await).await;
    assert!(body.contains("carol"));
    assert!(body.contains("href=\"/logout\""));
}

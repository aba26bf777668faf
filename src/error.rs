// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent HTML responses.

use crate::config::ConfigError;
use crate::views;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Not found, or not visible to the caller. The two are never distinguished.
    #[error("Not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    OAuthNotConfigured(String),

    #[error("Identity provider error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::OAuthIncomplete => AppError::OAuthNotConfigured(err.to_string()),
            other => AppError::Internal(other.into()),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::OAuthNotConfigured(_) => StatusCode::PRECONDITION_FAILED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound => "Not found".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::OAuthNotConfigured(msg) => msg.clone(),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Identity provider error");
                msg.clone()
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Something went wrong while reading data".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
        };

        (status, Html(views::error_page(status, &message))).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ConfigError::OAuthIncomplete).status(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            AppError::Upstream("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_database_detail_not_rendered() {
        let response = AppError::Database("secret table layout".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(!body.contains("secret table layout"));
    }
}

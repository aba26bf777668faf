// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The configuration is read once at startup and then shared read-only
//! through [`crate::AppState`].

use std::env;

/// Path the OAuth provider redirects back to after authorization.
pub const OAUTH_CALLBACK_PATH: &str = "/linux";

/// OAuth provider settings. All five must be present for login to work.
#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Authorization endpoint the browser is sent to
    pub auth_url: String,
    /// Token endpoint for the authorization-code exchange
    pub token_url: String,
    /// Profile endpoint queried with the access token
    pub userinfo_url: String,
}

impl OAuthSettings {
    /// Whether every provider setting is populated.
    pub fn is_enabled(&self) -> bool {
        [
            &self.client_id,
            &self.client_secret,
            &self.auth_url,
            &self.token_url,
            &self.userinfo_url,
        ]
        .iter()
        .all(|value| !value.is_empty())
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the server binds to
    pub listen_addr: String,
    /// SQLite database file
    pub database_path: String,
    /// HMAC key for session cookies (raw bytes)
    pub session_secret: Vec<u8>,
    /// Shared admin passphrase; `None` disables admin elevation
    pub admin_key: Option<String>,
    /// Public base URL without trailing slash
    pub base_url: String,
    pub oauth: OAuthSettings,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".to_string(),
            database_path: ":memory:".to_string(),
            session_secret: b"test_session_secret_32_bytes_min".to_vec(),
            admin_key: Some("test_admin_key".to_string()),
            base_url: "http://localhost:3000".to_string(),
            oauth: OAuthSettings::default(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let session_secret = get("SESSION_SECRET")
            .ok_or(ConfigError::Missing("SESSION_SECRET"))?
            .into_bytes();

        let admin_key = get("ADMIN_KEY");
        if admin_key.is_none() {
            tracing::warn!("ADMIN_KEY is not set; admin elevation is disabled");
        }

        let base_url = get("APP_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            listen_addr: get("LISTEN_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            database_path: get("DATABASE_PATH").unwrap_or_else(|| "./data.db".to_string()),
            session_secret,
            admin_key,
            base_url,
            // Provider settings may be blank: the site runs with login disabled.
            oauth: OAuthSettings {
                client_id: get("LINUXDO_CLIENT_ID").unwrap_or_default(),
                client_secret: get("LINUXDO_CLIENT_SECRET").unwrap_or_default(),
                auth_url: get("LINUXDO_AUTH_URL").unwrap_or_default(),
                token_url: get("LINUXDO_TOKEN_URL").unwrap_or_default(),
                userinfo_url: get("LINUXDO_USERINFO_URL").unwrap_or_default(),
            },
        })
    }

    /// Cookies get the `Secure` flag only when served over HTTPS.
    pub fn base_url_is_tls(&self) -> bool {
        self.base_url.to_ascii_lowercase().starts_with("https://")
    }

    /// Absolute redirect URL registered with the OAuth provider.
    pub fn oauth_redirect_url(&self) -> String {
        format!("{}{}", self.base_url, OAUTH_CALLBACK_PATH)
    }

    /// Fail with [`ConfigError::OAuthIncomplete`] unless login is fully configured.
    pub fn validate_oauth(&self) -> Result<(), ConfigError> {
        if self.oauth.is_enabled() {
            Ok(())
        } else {
            Err(ConfigError::OAuthIncomplete)
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error(
        "OAuth login is not fully configured: LINUXDO_CLIENT_ID/SECRET and \
         LINUXDO_AUTH_URL/TOKEN_URL/USERINFO_URL are all required"
    )]
    OAuthIncomplete,
}

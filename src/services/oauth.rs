// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth identity provider client.
//!
//! Handles:
//! - Building the authorization redirect
//! - Authorization-code exchange at the token endpoint
//! - Fetching and interpreting the userinfo profile

use crate::config::{Config, OAuthSettings};
use crate::error::AppError;
use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Deadline for each call to the provider.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

const SCOPES: &str = "openid profile";
const ID_KEYS: [&str; 3] = ["sub", "id", "user_id"];
const NAME_KEYS: [&str; 3] = ["username", "name", "login"];
const AVATAR_KEYS: [&str; 2] = ["avatar_url", "avatar"];

/// Identity reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Stable provider-side identifier
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Provider client.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    settings: OAuthSettings,
    redirect_url: String,
}

impl OAuthClient {
    /// Create a client from the application config. Works with blank settings;
    /// callers check [`Config::validate_oauth`] before use.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Self {
            http,
            settings: config.oauth.clone(),
            redirect_url: config.oauth_redirect_url(),
        })
    }

    /// URL the browser is sent to in order to authorize.
    pub fn authorize_url(&self, state: &str) -> String {
        let separator = if self.settings.auth_url.contains('?') {
            '&'
        } else {
            '?'
        };

        format!(
            "{}{}response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.settings.auth_url,
            separator,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.settings.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Token exchange request failed");
                AppError::Upstream("token exchange failed".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Token endpoint rejected the code");
            return Err(AppError::Upstream("token exchange failed".to_string()));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Token response is not valid JSON");
            AppError::Upstream("token exchange failed".to_string())
        })?;

        token
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Upstream("token response missing access_token".to_string()))
    }

    /// Fetch the caller's profile with the access token.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<ProviderIdentity, AppError> {
        let response = self
            .http
            .get(&self.settings.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "userinfo request failed: HTTP {}",
                response.status()
            )));
        }

        let profile: Map<String, Value> = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("userinfo JSON parse error: {}", e)))?;

        extract_identity(&profile).ok_or_else(|| {
            AppError::Upstream(format!(
                "unexpected userinfo shape: {}",
                Value::Object(profile)
            ))
        })
    }
}

fn first_string(profile: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| profile.get(*key).and_then(Value::as_str))
        .find(|value| !value.trim().is_empty())
        .map(str::to_string)
}

/// Pull identity fields out of a userinfo profile, trying keys in priority order.
pub fn extract_identity(profile: &Map<String, Value>) -> Option<ProviderIdentity> {
    Some(ProviderIdentity {
        external_id: first_string(profile, &ID_KEYS)?,
        display_name: first_string(profile, &NAME_KEYS)?,
        avatar_url: first_string(profile, &AVATAR_KEYS),
    })
}

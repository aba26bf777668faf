// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-cookie sessions.
//!
//! Claims travel in the cookie itself as `base64url(json) "." base64url(mac)`,
//! where the MAC is HMAC-SHA256 over the JSON bytes. Nothing is stored
//! server-side, so logging out only deletes the browser's copy: a cookie
//! captured before logout stays valid until its expiry.

use crate::config::Config;
use anyhow::anyhow;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "fs_session";

/// Lifetime of freshly issued claims.
pub const SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Facts carried by a session cookie.
///
/// The default value is the anonymous session. User identity and admin
/// elevation are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Internal user id; `None` when not logged in
    #[serde(rename = "uid", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Set by presenting the admin passphrase
    #[serde(rename = "isAdmin", default, skip_serializing_if = "is_false")]
    pub is_admin: bool,
    /// Unix seconds; filled in on encode when absent
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SessionClaims {
    /// Claims for a logged-in user, keeping the given admin flag.
    pub fn for_user(user_id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin,
            expires_at: None,
        }
    }

    /// Claims with admin elevation added to the current identity.
    pub fn elevated(user_id: Option<String>) -> Self {
        Self {
            user_id,
            is_admin: true,
            expires_at: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// Encodes and verifies session cookies with the server secret.
#[derive(Clone)]
pub struct SessionCodec {
    secret: Vec<u8>,
    secure: bool,
}

impl SessionCodec {
    pub fn new(secret: impl Into<Vec<u8>>, secure: bool) -> Self {
        Self {
            secret: secret.into(),
            secure,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.session_secret.clone(), config.base_url_is_tls())
    }

    fn mac(&self) -> anyhow::Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| anyhow!("HMAC init failed: {}", e))
    }

    /// Encode claims into a cookie value. Missing expiry becomes `now` + 30 days.
    pub fn encode(&self, claims: &SessionClaims, now: i64) -> anyhow::Result<String> {
        let mut claims = claims.clone();
        if claims.expires_at.is_none() {
            claims.expires_at = Some(now + SESSION_TTL_SECS);
        }

        let payload = serde_json::to_vec(&claims)?;
        let mut mac = self.mac()?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Decode a cookie value. Anything that fails to verify is anonymous.
    pub fn decode(&self, value: &str, now: i64) -> SessionClaims {
        self.verify(value, now).unwrap_or_else(|| {
            tracing::debug!("Discarding unverifiable session cookie");
            SessionClaims::default()
        })
    }

    fn verify(&self, value: &str, now: i64) -> Option<SessionClaims> {
        let (payload_b64, signature_b64) = value.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        let mut mac = self.mac().ok()?;
        mac.update(&payload);
        mac.verify_slice(&signature).ok()?;

        let mut claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        match claims.expires_at {
            Some(exp) if exp > now => {}
            _ => return None,
        }
        claims.user_id = claims.user_id.filter(|id| !id.is_empty());
        Some(claims)
    }

    /// Read the session from a request's cookies.
    pub fn claims_from_jar(&self, jar: &CookieJar) -> SessionClaims {
        jar.get(SESSION_COOKIE)
            .map(|cookie| self.decode(cookie.value(), chrono::Utc::now().timestamp()))
            .unwrap_or_default()
    }

    /// Build the `Set-Cookie` for the given claims.
    pub fn issue_cookie(&self, claims: &SessionClaims) -> anyhow::Result<Cookie<'static>> {
        let now = chrono::Utc::now().timestamp();
        let value = self.encode(claims, now)?;
        let expires_at = claims.expires_at.unwrap_or(now + SESSION_TTL_SECS);
        let max_age = time::Duration::seconds((expires_at - now).max(0));

        Ok(http_only_cookie(SESSION_COOKIE, value, self.secure, max_age))
    }

    /// Cookie that makes the browser discard the session immediately.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        removal_cookie(SESSION_COOKIE, self.secure)
    }
}

/// HttpOnly, SameSite=Lax cookie scoped to the whole site.
pub fn http_only_cookie(
    name: &'static str,
    value: String,
    secure: bool,
    max_age: time::Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Same attributes as [`http_only_cookie`], empty and already expired.
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random identifiers and OAuth state tokens.

use anyhow::anyhow;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

const ID_BYTES: usize = 16;
const STATE_BYTES: usize = 24;

fn random_bytes<const N: usize>() -> anyhow::Result<[u8; N]> {
    let mut buf = [0u8; N];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| anyhow!("system random source unavailable"))?;
    Ok(buf)
}

/// Opaque row id: 16 random bytes, lowercase hex.
pub fn new_id() -> anyhow::Result<String> {
    Ok(hex::encode(random_bytes::<ID_BYTES>()?))
}

/// Anti-forgery state for the OAuth redirect: 24 random bytes, base64url.
pub fn new_state_token() -> anyhow::Result<String> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes::<STATE_BYTES>()?))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Feedback Square: a small feedback board
//!
//! Users log in through an external OAuth provider and post feedback items,
//! public or private. An admin, elevated by a shared passphrase, answers
//! them with replies. Everything is stored in SQLite and sessions live in
//! signed cookies.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use db::SqliteDb;
use services::{OAuthClient, SessionCodec};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SqliteDb,
    pub sessions: SessionCodec,
    pub oauth: OAuthClient,
}

impl AppState {
    /// Assemble the state from a loaded config and an opened store.
    pub fn new(config: Config, db: SqliteDb) -> anyhow::Result<Self> {
        let sessions = SessionCodec::from_config(&config);
        let oauth = OAuthClient::new(&config)?;

        Ok(Self {
            config,
            db,
            sessions,
            oauth,
        })
    }
}

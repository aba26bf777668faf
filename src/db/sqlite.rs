// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (created or refreshed on OAuth login)
//! - Feedback items (public feed, own feed, detail)
//! - Replies (admin responses on an item)
//!
//! A single pooled connection serializes all access; SQLite's own locking
//! covers the rest. Every operation runs under a deadline.

use crate::error::AppError;
use crate::models::{Feedback, NewFeedback, NewReply, Reply, User};
use crate::services::oauth::ProviderIdentity;
use crate::services::token;
use crate::time_utils::from_unix_seconds;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

/// Deadline for cheap lookups (home counter, viewer name).
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);
/// Deadline for listings, detail reads and writes.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const PUBLIC_FEED_LIMIT: i64 = 50;
const OWN_FEED_LIMIT: i64 = 100;

#[derive(FromRow)]
struct UserRow {
    id: String,
    external_id: String,
    display_name: String,
    avatar_url: Option<String>,
    created_at: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            created_at: from_unix_seconds(row.created_at),
        }
    }
}

#[derive(FromRow)]
struct FeedbackRow {
    id: String,
    title: String,
    content: String,
    is_public: bool,
    user_id: String,
    author_name: String,
    created_at: i64,
    updated_at: i64,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            is_public: row.is_public,
            user_id: row.user_id,
            author_name: row.author_name,
            created_at: from_unix_seconds(row.created_at),
            updated_at: from_unix_seconds(row.updated_at),
        }
    }
}

#[derive(FromRow)]
struct ReplyRow {
    id: String,
    content: String,
    created_at: i64,
    admin_name: Option<String>,
}

impl From<ReplyRow> for Reply {
    fn from(row: ReplyRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: from_unix_seconds(row.created_at),
            admin_name: row.admin_name,
        }
    }
}

const FEEDBACK_COLUMNS: &str = "f.id, f.title, f.content, f.is_public, f.user_id, \
     u.display_name AS author_name, f.created_at, f.updated_at";

/// Escape `LIKE` wildcards so the search term matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// SQLite database client.
#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// `:memory:` opens a private in-memory database.
    pub async fn open(path: &str) -> Result<Self, AppError> {
        if path == ":memory:" {
            return Self::open_in_memory().await;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(QUERY_TIMEOUT);

        let db = Self::connect(options).await?;
        tracing::info!(path, "Opened SQLite database");
        Ok(db)
    }

    /// Open a fresh in-memory database (tests, throwaway runs).
    pub async fn open_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, AppError> {
        // One connection: serializes writers, and keeps an in-memory
        // database alive for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(QUERY_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open SQLite database: {}", e)))?;

        Ok(Self { pool })
    }

    /// Returns the connection pool for testing or advanced usage.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `fut` under `limit`, mapping expiry to a database error.
    async fn bounded<T, F>(&self, limit: Duration, op: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(|e| AppError::Database(format!("{}: {}", op, e))),
            Err(_) => Err(AppError::Database(format!("{}: deadline exceeded", op))),
        }
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                avatar_url TEXT,
                created_at INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS feedback (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id)
            )",
            "CREATE INDEX IF NOT EXISTS idx_feedback_public_created ON feedback(is_public, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_feedback_user_created ON feedback(user_id, created_at)",
            "CREATE TABLE IF NOT EXISTS replies (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                feedback_id TEXT NOT NULL REFERENCES feedback(id) ON DELETE CASCADE,
                admin_user_id TEXT REFERENCES users(id)
            )",
            "CREATE INDEX IF NOT EXISTS idx_replies_feedback_created ON replies(feedback_id, created_at)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Database(format!("Failed to create schema: {}", e)))?;
        }

        tracing::debug!("Database schema ready");
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by internal id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let row = self
            .bounded(
                LOOKUP_TIMEOUT,
                "get_user",
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, external_id, display_name, avatar_url, created_at \
                     FROM users WHERE id = ?",
                )
                .bind(user_id)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(User::from))
    }

    /// Get a user by provider-side identifier.
    pub async fn get_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, AppError> {
        let row = self
            .bounded(
                QUERY_TIMEOUT,
                "get_user_by_external_id",
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, external_id, display_name, avatar_url, created_at \
                     FROM users WHERE external_id = ?",
                )
                .bind(external_id)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(User::from))
    }

    /// Create the user for a provider identity, or refresh name and avatar of
    /// the existing one. Returns the internal id.
    ///
    /// A single conditional insert, so concurrent first logins for the same
    /// identity converge on one row.
    pub async fn upsert_user_by_external_id(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<String, AppError> {
        let new_id = token::new_id()?;
        let now = chrono::Utc::now().timestamp();

        self.bounded(
            QUERY_TIMEOUT,
            "upsert_user",
            sqlx::query_scalar::<_, String>(
                "INSERT INTO users (id, external_id, display_name, avatar_url, created_at) \
                 VALUES (?, ?, ?, ?, ?) \
                 ON CONFLICT(external_id) DO UPDATE SET \
                     display_name = excluded.display_name, \
                     avatar_url = excluded.avatar_url \
                 RETURNING id",
            )
            .bind(&new_id)
            .bind(&identity.external_id)
            .bind(&identity.display_name)
            .bind(identity.avatar_url.as_deref().filter(|a| !a.trim().is_empty()))
            .bind(now)
            .fetch_one(&self.pool),
        )
        .await
    }

    // ─── Feedback Operations ─────────────────────────────────────

    /// Number of public items (home page).
    pub async fn count_public_feedback(&self) -> Result<i64, AppError> {
        self.bounded(
            LOOKUP_TIMEOUT,
            "count_public_feedback",
            sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM feedback WHERE is_public = 1")
                .fetch_one(&self.pool),
        )
        .await
    }

    /// Store a new item owned by `user_id`. Returns its id.
    pub async fn insert_feedback(
        &self,
        user_id: &str,
        feedback: &NewFeedback,
    ) -> Result<String, AppError> {
        let id = token::new_id()?;
        let now = chrono::Utc::now().timestamp();

        self.bounded(
            QUERY_TIMEOUT,
            "insert_feedback",
            sqlx::query(
                "INSERT INTO feedback (id, title, content, is_public, created_at, updated_at, user_id) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&feedback.title)
            .bind(&feedback.content)
            .bind(feedback.is_public)
            .bind(now)
            .bind(now)
            .bind(user_id)
            .execute(&self.pool),
        )
        .await?;

        tracing::info!(feedback_id = %id, user_id, is_public = feedback.is_public, "Feedback created");
        Ok(id)
    }

    /// Get one item with its author's name.
    pub async fn get_feedback(&self, feedback_id: &str) -> Result<Option<Feedback>, AppError> {
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback f \
             JOIN users u ON u.id = f.user_id \
             WHERE f.id = ?"
        );

        let row = self
            .bounded(
                QUERY_TIMEOUT,
                "get_feedback",
                sqlx::query_as::<_, FeedbackRow>(&sql)
                    .bind(feedback_id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(Feedback::from))
    }

    /// Public items, newest first, optionally filtered by a case-insensitive
    /// substring of title or body.
    pub async fn list_public_feedback(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<Feedback>, AppError> {
        let pattern = search
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(like_pattern);

        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback f \
             JOIN users u ON u.id = f.user_id \
             WHERE f.is_public = 1 \
               AND (?1 IS NULL OR f.title LIKE ?1 ESCAPE '\\' OR f.content LIKE ?1 ESCAPE '\\') \
             ORDER BY f.created_at DESC, f.rowid DESC \
             LIMIT ?2"
        );

        let rows = self
            .bounded(
                QUERY_TIMEOUT,
                "list_public_feedback",
                sqlx::query_as::<_, FeedbackRow>(&sql)
                    .bind(pattern)
                    .bind(PUBLIC_FEED_LIMIT)
                    .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows.into_iter().map(Feedback::from).collect())
    }

    /// Everything `user_id` posted, public or not, newest first.
    pub async fn list_feedback_for_user(&self, user_id: &str) -> Result<Vec<Feedback>, AppError> {
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback f \
             JOIN users u ON u.id = f.user_id \
             WHERE f.user_id = ? \
             ORDER BY f.created_at DESC, f.rowid DESC \
             LIMIT ?"
        );

        let rows = self
            .bounded(
                QUERY_TIMEOUT,
                "list_feedback_for_user",
                sqlx::query_as::<_, FeedbackRow>(&sql)
                    .bind(user_id)
                    .bind(OWN_FEED_LIMIT)
                    .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows.into_iter().map(Feedback::from).collect())
    }

    // ─── Reply Operations ────────────────────────────────────────

    /// Store an admin reply. `admin_user_id` is `None` for identity-less admin sessions.
    pub async fn insert_reply(
        &self,
        feedback_id: &str,
        admin_user_id: Option<&str>,
        reply: &NewReply,
    ) -> Result<String, AppError> {
        let id = token::new_id()?;
        let now = chrono::Utc::now().timestamp();

        self.bounded(
            QUERY_TIMEOUT,
            "insert_reply",
            sqlx::query(
                "INSERT INTO replies (id, content, created_at, feedback_id, admin_user_id) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&reply.content)
            .bind(now)
            .bind(feedback_id)
            .bind(admin_user_id)
            .execute(&self.pool),
        )
        .await?;

        tracing::info!(reply_id = %id, feedback_id, "Reply created");
        Ok(id)
    }

    /// Replies on an item in conversation order (oldest first).
    pub async fn list_replies(&self, feedback_id: &str) -> Result<Vec<Reply>, AppError> {
        let rows = self
            .bounded(
                QUERY_TIMEOUT,
                "list_replies",
                sqlx::query_as::<_, ReplyRow>(
                    "SELECT r.id, r.content, r.created_at, u.display_name AS admin_name \
                     FROM replies r \
                     LEFT JOIN users u ON u.id = r.admin_user_id \
                     WHERE r.feedback_id = ? \
                     ORDER BY r.created_at ASC, r.rowid ASC",
                )
                .bind(feedback_id)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows.into_iter().map(Reply::from).collect())
    }
}

//! User model for storage and display.

use chrono::{DateTime, Utc};

/// Local user, created on first OAuth login and refreshed on every later one.
#[derive(Debug, Clone)]
pub struct User {
    /// Internal id (random hex)
    pub id: String,
    /// Provider-side identifier; unique and never changed
    pub external_id: String,
    /// Name shown next to posts, refreshed on login
    pub display_name: String,
    /// Profile picture URL
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

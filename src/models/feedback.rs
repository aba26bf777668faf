// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feedback items and admin replies.

use chrono::{DateTime, Utc};
use validator::Validate;

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: u64 = 200;
/// Longest accepted body (feedback or reply), in characters.
pub const MAX_CONTENT_CHARS: u64 = 20_000;

/// A stored feedback item joined with its author's display name.
#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: String,
    pub title: String,
    /// Raw markdown
    pub content: String,
    pub is_public: bool,
    /// Owning user
    pub user_id: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new feedback item.
#[derive(Debug, Clone, Validate)]
pub struct NewFeedback {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 20000, message = "content must be 1-20000 characters"))]
    pub content: String,
    pub is_public: bool,
}

impl NewFeedback {
    /// Build from raw form values. Text is trimmed; `is_public` is true
    /// unless the form sent exactly `"0"`.
    pub fn from_form(title: &str, content: &str, is_public: Option<&str>) -> Self {
        Self {
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            is_public: is_public.map(|v| v.trim() != "0").unwrap_or(true),
        }
    }
}

/// An admin reply, with the replying admin's display name when known.
#[derive(Debug, Clone)]
pub struct Reply {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub admin_name: Option<String>,
}

/// Validated input for a new reply.
#[derive(Debug, Clone, Validate)]
pub struct NewReply {
    #[validate(length(min = 1, max = 20000, message = "reply must be 1-20000 characters"))]
    pub content: String,
}

impl NewReply {
    pub fn from_form(content: &str) -> Self {
        Self {
            content: content.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_length_bounds() {
        let ok = NewFeedback::from_form(&"t".repeat(200), "body", None);
        assert!(ok.validate().is_ok());

        let too_long = NewFeedback::from_form(&"t".repeat(201), "body", None);
        assert!(too_long.validate().is_err());

        let blank = NewFeedback::from_form("   ", "body", None);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let title = "é".repeat(200);
        assert_eq!(title.len(), 400);
        assert!(NewFeedback::from_form(&title, "body", None).validate().is_ok());
    }

    #[test]
    fn test_content_length_bounds() {
        let ok = NewFeedback::from_form("t", &"c".repeat(20_000), None);
        assert!(ok.validate().is_ok());

        let too_long = NewFeedback::from_form("t", &"c".repeat(20_001), None);
        assert!(too_long.validate().is_err());

        assert!(NewFeedback::from_form("t", "\n\t ", None).validate().is_err());
    }

    #[test]
    fn test_is_public_flag() {
        assert!(NewFeedback::from_form("t", "c", None).is_public);
        assert!(NewFeedback::from_form("t", "c", Some("1")).is_public);
        assert!(NewFeedback::from_form("t", "c", Some("on")).is_public);
        assert!(!NewFeedback::from_form("t", "c", Some("0")).is_public);
        assert!(!NewFeedback::from_form("t", "c", Some(" 0 ")).is_public);
    }

    #[test]
    fn test_reply_bounds() {
        assert!(NewReply::from_form(" thanks ").validate().is_ok());
        assert_eq!(NewReply::from_form(" thanks ").content, "thanks");
        assert!(NewReply::from_form("  ").validate().is_err());
        assert!(NewReply::from_form(&"r".repeat(20_001)).validate().is_err());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Who may see a feedback item.

use crate::models::Feedback;
use crate::services::session::SessionClaims;

/// An item is visible when it is public, the caller is admin, or the caller owns it.
pub fn can_view(session: &SessionClaims, item: &Feedback) -> bool {
    item.is_public || session.is_admin || session.user_id() == Some(item.user_id.as_str())
}

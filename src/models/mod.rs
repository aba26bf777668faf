// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod feedback;
pub mod user;

pub use feedback::{Feedback, NewFeedback, NewReply, Reply};
pub use user::User;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod markdown;
pub mod oauth;
pub mod session;
pub mod token;
pub mod visibility;

pub use oauth::{OAuthClient, ProviderIdentity};
pub use session::{SessionClaims, SessionCodec};
pub use visibility::can_view;

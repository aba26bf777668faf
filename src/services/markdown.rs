// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Markdown rendering for feedback and reply bodies.
//!
//! The renderer is allowed to emit any HTML (including raw HTML from the
//! source text); everything goes through `ammonia` before it reaches a page.

use pulldown_cmark::{html, Options, Parser};

/// Render markdown to sanitized HTML.
pub fn render(text: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut unsafe_html = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut unsafe_html, Parser::new_ext(text, options));

    ammonia::clean(&unsafe_html)
}

/// Escape plain text for inclusion in HTML.
pub fn escape(text: &str) -> String {
    ammonia::clean_text(text)
}

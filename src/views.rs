// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML page rendering.
//!
//! Every user-supplied string is either escaped or passed through the
//! markdown sanitizer before it lands in the output.

use crate::models::feedback::{MAX_CONTENT_CHARS, MAX_TITLE_CHARS};
use crate::models::{Feedback, Reply};
use crate::services::markdown::{escape, render};
use crate::time_utils::{format_display, format_utc_rfc3339};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};

/// What the navigation bar needs to know about the caller.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    /// Display name of the logged-in user, if any
    pub user_name: Option<String>,
    pub logged_in: bool,
    pub is_admin: bool,
}

/// Outcome shown on the admin page after a passphrase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminNotice {
    None,
    Elevated,
    Rejected,
}

fn time_tag(date: DateTime<Utc>) -> String {
    format!(
        "<time datetime=\"{}\">{}</time>",
        format_utc_rfc3339(date),
        format_display(date)
    )
}

fn nav_bar(nav: &Nav) -> String {
    let mut links = vec![
        "<a href=\"/\">Home</a>".to_string(),
        "<a href=\"/square\">Square</a>".to_string(),
    ];

    if nav.logged_in {
        links.push("<a href=\"/new\">New feedback</a>".to_string());
        links.push("<a href=\"/me\">My feedback</a>".to_string());
    }
    if nav.is_admin {
        links.push("<span class=\"badge\">admin</span>".to_string());
    }
    match (&nav.user_name, nav.logged_in || nav.is_admin) {
        (Some(name), _) => {
            links.push(format!("<span class=\"user\">{}</span>", escape(name)));
            links.push("<a href=\"/logout\">Log out</a>".to_string());
        }
        (None, true) => links.push("<a href=\"/logout\">Log out</a>".to_string()),
        (None, false) => links.push("<a href=\"/login\">Log in</a>".to_string()),
    }

    format!("<nav>{}</nav>", links.join(" "))
}

fn layout(title: &str, nav: Option<&Nav>, body: &str) -> String {
    let nav = nav.map(nav_bar).unwrap_or_default();
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<link rel=\"stylesheet\" href=\"/static/app.css\">\n</head>\n\
         <body>\n<header>{nav}</header>\n<main>\n{body}\n</main>\n\
         <footer>&copy; {year} Feedback Square</footer>\n</body>\n</html>\n",
        title = escape(title),
        nav = nav,
        body = body,
        year = Utc::now().format("%Y"),
    )
}

fn feedback_list(items: &[Feedback], show_visibility: bool) -> String {
    if items.is_empty() {
        return "<p class=\"empty\">Nothing here yet.</p>".to_string();
    }

    let entries: Vec<String> = items
        .iter()
        .map(|item| {
            let badge = if show_visibility && !item.is_public {
                " <span class=\"badge\">private</span>"
            } else {
                ""
            };
            format!(
                "<li><a href=\"/square/{id}\">{title}</a>{badge} \
                 <span class=\"meta\">by {author} &middot; {time}</span></li>",
                id = escape(&item.id),
                title = escape(&item.title),
                badge = badge,
                author = escape(&item.author_name),
                time = time_tag(item.created_at),
            )
        })
        .collect();

    format!("<ul class=\"feed\">{}</ul>", entries.join("\n"))
}

pub fn home_page(nav: &Nav, public_count: i64) -> String {
    let call_to_action = if nav.logged_in {
        "<p><a class=\"button\" href=\"/new\">Write feedback</a></p>"
    } else {
        "<p><a class=\"button\" href=\"/login\">Log in to write feedback</a></p>"
    };
    let body = format!(
        "<h1>Feedback Square</h1>\n<p>{public_count} public feedback items so far. \
         <a href=\"/square\">Browse them</a>.</p>\n{call_to_action}"
    );
    layout("Feedback Square", Some(nav), &body)
}

pub fn square_page(nav: &Nav, query: &str, items: &[Feedback]) -> String {
    let body = format!(
        "<h1>Square</h1>\n<form method=\"get\" action=\"/square\">\
         <input type=\"search\" name=\"q\" value=\"{q}\" placeholder=\"Search\">\
         <button type=\"submit\">Search</button></form>\n{list}",
        q = escape(query),
        list = feedback_list(items, false),
    );
    layout("Square", Some(nav), &body)
}

pub fn detail_page(
    nav: &Nav,
    item: &Feedback,
    replies: &[Reply],
    reply_error: bool,
) -> String {
    let visibility = if item.is_public { "public" } else { "private" };
    let mut body = format!(
        "<article>\n<h1>{title}</h1>\n<p class=\"meta\">by {author} &middot; {time} \
         &middot; <span class=\"badge\">{visibility}</span></p>\n\
         <div class=\"markdown\">{content}</div>\n</article>\n",
        title = escape(&item.title),
        author = escape(&item.author_name),
        time = time_tag(item.created_at),
        visibility = visibility,
        content = render(&item.content),
    );

    body.push_str("<section class=\"replies\">\n<h2>Replies</h2>\n");
    if replies.is_empty() {
        body.push_str("<p class=\"empty\">No replies yet.</p>\n");
    }
    for reply in replies {
        body.push_str(&format!(
            "<div class=\"reply\"><p class=\"meta\">{admin} &middot; {time}</p>\
             <div class=\"markdown\">{content}</div></div>\n",
            admin = escape(reply.admin_name.as_deref().unwrap_or("")),
            time = time_tag(reply.created_at),
            content = render(&reply.content),
        ));
    }

    if reply_error {
        body.push_str(
            "<p class=\"error\">Reply not saved: it must be non-empty and at most \
             20000 characters.</p>\n",
        );
    }
    if nav.is_admin {
        body.push_str(&format!(
            "<form method=\"post\" action=\"/square/{id}/reply\">\
             <textarea name=\"content\" maxlength=\"{max}\" required></textarea>\
             <button type=\"submit\">Reply</button></form>\n",
            id = escape(&item.id),
            max = MAX_CONTENT_CHARS,
        ));
    }
    body.push_str("</section>");

    layout(&item.title, Some(nav), &body)
}

pub fn new_page(nav: &Nav, write_failed: bool) -> String {
    let error = if write_failed {
        "<p class=\"error\">Could not save your feedback, please try again.</p>\n"
    } else {
        ""
    };
    let body = format!(
        "<h1>New feedback</h1>\n{error}<form method=\"post\" action=\"/new\">\n\
         <label>Title <input name=\"title\" maxlength=\"{max_title}\" required></label>\n\
         <label>Content (Markdown) <textarea name=\"content\" maxlength=\"{max_content}\" \
         required></textarea></label>\n\
         <label>Visibility <select name=\"is_public\">\
         <option value=\"1\">Public</option><option value=\"0\">Private</option>\
         </select></label>\n<button type=\"submit\">Submit</button>\n</form>",
        error = error,
        max_title = MAX_TITLE_CHARS,
        max_content = MAX_CONTENT_CHARS,
    );
    layout("New feedback", Some(nav), &body)
}

pub fn me_page(nav: &Nav, items: &[Feedback]) -> String {
    let body = format!("<h1>My feedback</h1>\n{}", feedback_list(items, true));
    layout("My feedback", Some(nav), &body)
}

pub fn admin_page(nav: &Nav, notice: AdminNotice) -> String {
    let notice = match notice {
        AdminNotice::None => "",
        AdminNotice::Elevated => "<p class=\"ok\">Admin mode enabled.</p>\n",
        AdminNotice::Rejected => "<p class=\"error\">Wrong passphrase.</p>\n",
    };
    let status = if nav.is_admin {
        "<p>This session has admin rights.</p>\n"
    } else {
        ""
    };
    let body = format!(
        "<h1>Admin</h1>\n{notice}{status}<form method=\"post\" action=\"/admin\">\
         <label>Passphrase <input type=\"password\" name=\"key\" required></label>\
         <button type=\"submit\">Enter</button></form>"
    );
    layout("Admin", Some(nav), &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{code}</h1>\n<p class=\"error\">{message}</p>\n<p><a href=\"/\">Back home</a></p>",
        code = status.as_u16(),
        message = escape(message),
    );
    layout("Error", None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, content: &str) -> Feedback {
        Feedback {
            id: "abc".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            is_public: false,
            user_id: "u".to_string(),
            author_name: "<i>mallory</i>".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_detail_escapes_title_and_author() {
        let page = detail_page(
            &Nav::default(),
            &item("<script>x</script>", "hi"),
            &[],
            false,
        );
        assert!(!page.contains("<script>x"));
        assert!(!page.contains("<i>mallory</i>"));
    }

    #[test]
    fn test_detail_reply_form_only_for_admin() {
        let feedback = item("t", "c");
        let anonymous = detail_page(&Nav::default(), &feedback, &[], false);
        assert!(!anonymous.contains("/square/abc/reply"));

        let admin = Nav {
            is_admin: true,
            ..Nav::default()
        };
        assert!(detail_page(&admin, &feedback, &[], true).contains("/square/abc/reply"));
    }

    #[test]
    fn test_nav_login_state() {
        assert!(home_page(&Nav::default(), 3).contains("href=\"/login\""));

        let nav = Nav {
            user_name: Some("alice".to_string()),
            logged_in: true,
            is_admin: false,
        };
        let page = home_page(&nav, 3);
        assert!(page.contains("href=\"/logout\""));
        assert!(page.contains("alice"));
    }
}

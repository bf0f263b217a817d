//! HTML rendering helpers. Pages are assembled as escaped strings inside a
//! shared layout; no client-side framework is involved beyond a small inline
//! script that applies SSE patches.

use chrono::{DateTime, Utc};

use agora_types::models::{Notification, Post, Session, Thread};

/// Escape text for interpolation into HTML.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shared page chrome. The nav reflects the session: anonymous visitors get
/// sign-in links, members get their dashboard and notifications, staff get
/// the console link.
pub fn layout(title: &str, session: Option<&Session>, body: &str) -> String {
    let nav = match session {
        None => concat!(
            r#"<a href="/threads">Threads</a> "#,
            r#"<a href="/search">Search</a> "#,
            r#"<a href="/login">Sign in</a> "#,
            r#"<a href="/register">Register</a>"#,
        )
        .to_string(),
        Some(s) => {
            let mut nav = String::from(
                r#"<a href="/threads">Threads</a> <a href="/search">Search</a> "#,
            );
            nav.push_str(&format!(r#"<a href="{}">{}</a> "#, s.role.home_path(), escape(&s.display_name)));
            nav.push_str(r#"<a href="/notifications">Notifications</a> "#);
            nav.push_str(
                r#"<form method="post" action="/logout" class="inline"><button type="submit">Sign out</button></form>"#,
            );
            nav
        }
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - Agora</title>
<style>
body {{ font-family: sans-serif; max-width: 52rem; margin: 0 auto; padding: 0 1rem; }}
header {{ display: flex; justify-content: space-between; align-items: baseline; padding: 1rem 0; border-bottom: 1px solid #ddd; }}
nav a, .brand {{ margin-right: .75rem; }}
.banner.error {{ background: #fde8e8; padding: .5rem; }}
.banner.warn {{ background: #fdf6e8; padding: .5rem; }}
.meta {{ color: #666; font-size: .9rem; }}
.badge {{ background: #eee; padding: 0 .4rem; font-size: .8rem; }}
.inline {{ display: inline; }}
.notification.unread {{ font-weight: bold; }}
table {{ border-collapse: collapse; width: 100%; }}
td, th {{ border: 1px solid #ddd; padding: .3rem; text-align: left; }}
</style>
</head>
<body>
<header><a href="/" class="brand">Agora</a><nav>{nav}</nav></header>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    )
}

/// Inline error banner, rendered above the form that failed.
pub fn banner(message: &str) -> String {
    format!(r#"<div class="banner error">{}</div>"#, escape(message))
}

/// Shown on live pages when the realtime channel has given up reconnecting.
pub fn realtime_banner(connected: bool) -> String {
    if connected {
        String::new()
    } else {
        r#"<div class="banner warn">Live updates unavailable. Refresh to see the latest activity.</div>"#
            .to_string()
    }
}

/// Standalone error page body, wrapped in the layout without a session
/// (handlers that hit an error may no longer trust theirs).
pub fn error_page(title: &str, message: &str) -> String {
    layout(title, None, &format!("<h1>{}</h1><p>{}</p>", escape(title), escape(message)))
}

pub fn format_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn thread_card(thread: &Thread) -> String {
    let mut badges = String::new();
    if thread.pinned {
        badges.push_str(r#"<span class="badge">Pinned</span> "#);
    }
    if thread.locked {
        badges.push_str(r#"<span class="badge">Locked</span> "#);
    }
    let tags = thread
        .tags
        .iter()
        .map(|t| format!(r#"<span class="tag">{}</span>"#, escape(t)))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r#"<article class="thread-card" data-thread-id="{id}">
{badges}<h2><a href="/threads/{id}">{title}</a></h2>
<p class="meta">by {author} on {created} &middot; {posts} posts &middot; {views} views</p>
<p class="tags">{tags}</p>
</article>"#,
        id = thread.id,
        title = escape(&thread.title),
        author = escape(&thread.author.display_name),
        created = format_time(&thread.created_at),
        posts = thread.post_count,
        views = thread.view_count,
    )
}

pub fn post_item(post: &Post) -> String {
    format!(
        r#"<article class="post" data-post-id="{id}">
<p class="meta">{author} &middot; {created}</p>
<div class="content">{content}</div>
</article>"#,
        id = post.id,
        author = escape(&post.author.display_name),
        created = format_time(&post.created_at),
        content = escape(&post.content),
    )
}

pub fn notification_item(n: &Notification) -> String {
    let class = if n.is_read { "notification read" } else { "notification unread" };
    let link = match &n.link {
        Some(href) => format!(r#"<a href="{}">{}</a>"#, escape(href), escape(&n.title)),
        None => escape(&n.title),
    };
    let action = if n.is_read {
        String::new()
    } else {
        format!(
            r#"<form method="post" action="/notifications/{}/read" class="inline"><button type="submit">Mark read</button></form>"#,
            n.id
        )
    };
    format!(
        r#"<li class="{class}" data-notification-id="{id}">
<strong>{link}</strong>
<p>{message}</p>
<p class="meta">{created}</p>
{action}
</li>"#,
        id = n.id,
        message = escape(&n.message),
        created = format_time(&n.created_at),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("it's"), "it&#39;s");
        assert_eq!(escape("plain text"), "plain text");
    }

    #[test]
    fn layout_escapes_the_title() {
        let page = layout("<b>oops</b>", None, "<p>body</p>");
        assert!(page.contains("&lt;b&gt;oops&lt;/b&gt; - Agora"));
        assert!(page.contains("<p>body</p>"));
    }

    #[test]
    fn anonymous_nav_offers_sign_in() {
        let page = layout("Home", None, "");
        assert!(page.contains(r#"<a href="/login">Sign in</a>"#));
        assert!(!page.contains("/logout"));
    }
}

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use agora_types::models::Role;

use crate::session::session_from_jar;

/// Edge-level request inspector. Runs ahead of every page handler and
/// short-circuits unauthorized navigation with a redirect. A malformed token
/// already degraded to anonymous in the session layer, so the least
/// privileged rule applies automatically.
pub async fn route_guard(jar: CookieJar, req: Request, next: Next) -> Response {
    let role = session_from_jar(&jar).map(|s| s.role);
    if let Some(location) = decide(req.uri().path(), role) {
        return Redirect::to(&location).into_response();
    }
    next.run(req).await
}

/// The redirect table. `None` means the request passes through.
fn decide(path: &str, role: Option<Role>) -> Option<String> {
    // Authenticated users have no business on the auth pages
    if is_auth_page(path) {
        return role.map(|r| r.home_path().to_string());
    }

    let Some(role) = role else {
        if is_protected(path) {
            return Some(format!("/login?redirect={}", percent_encode(path)));
        }
        return None;
    };

    // Staff land on the console instead of the member dashboard
    if path == "/dashboard" && role.is_staff() {
        return Some("/admin".into());
    }
    if is_admin_path(path) && !role.is_staff() {
        return Some("/dashboard".into());
    }

    None
}

fn is_auth_page(path: &str) -> bool {
    matches!(path, "/login" | "/register")
}

fn is_admin_path(path: &str) -> bool {
    path == "/admin" || path.starts_with("/admin/")
}

/// Paths that require a session. Everything else (home, thread browsing,
/// search, verification) is public.
fn is_protected(path: &str) -> bool {
    path == "/dashboard"
        || path == "/logout"
        || path == "/threads/new"
        || path == "/events"
        || path == "/notifications"
        || path.starts_with("/notifications/")
        || is_admin_path(path)
        || (path.starts_with("/threads/") && (path.ends_with("/reply") || path.ends_with("/events")))
}

/// Percent-encode a path for use as a query value.
pub(crate) fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

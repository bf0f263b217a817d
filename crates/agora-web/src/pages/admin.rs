use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use agora_types::api::{ReportStatus, ResolveReportRequest, SetRoleRequest};
use agora_types::models::{Role, Session};

use crate::error::PageResult;
use crate::render::{self, escape};
use crate::session::session_from_jar;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// The route guard keeps members out, but handlers still need the session
/// for the API token. A missing one redirects rather than panics.
fn staff_session(jar: &CookieJar) -> Result<Session, Response> {
    match session_from_jar(jar) {
        Some(s) if s.role.is_staff() => Ok(s),
        Some(_) => Err(Redirect::to("/dashboard").into_response()),
        None => Err(Redirect::to("/login").into_response()),
    }
}

fn console_page(title: &str, session: &Session, content: &str) -> Html<String> {
    let nav = r#"<nav class="console-nav">
<a href="/admin">Overview</a>
<a href="/admin/users">Users</a>
<a href="/admin/threads">Threads</a>
<a href="/admin/posts">Posts</a>
<a href="/admin/reports">Reports</a>
<a href="/admin/moderation">Moderation log</a>
<a href="/admin/analytics">Analytics</a>
</nav>"#;
    let body = format!("{nav}<h1>{}</h1>{content}", escape(title));
    Html(render::layout(title, Some(session), &body))
}

pub async fn overview(State(state): State<AppState>, jar: CookieJar) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let summary = state.api_for(&session).analytics_summary().await?;
    let content = format!(
        r#"<ul class="stats">
<li>{} users</li>
<li>{} threads</li>
<li>{} posts</li>
<li><a href="/admin/reports">{} open reports</a></li>
<li>{} active today</li>
</ul>"#,
        summary.user_count,
        summary.thread_count,
        summary.post_count,
        summary.open_reports,
        summary.active_today,
    );
    Ok(console_page("Console", &session, &content).into_response())
}

pub async fn users(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let page = state.api_for(&session).list_users(query.page.unwrap_or(1)).await?;
    let mut content = String::from(
        "<table><tr><th>User</th><th>Email</th><th>Role</th><th>Threads</th><th>Posts</th><th></th></tr>",
    );
    for user in &page.items {
        // Role changes are admin-only; moderators see the roster read-only
        let role_form = if session.role == Role::Admin {
            format!(
                r#"<form method="post" action="/admin/users/{id}/role" class="inline">
<select name="role">{options}</select>
<button type="submit">Set</button>
</form>"#,
                id = user.id,
                options = role_options(user.role),
            )
        } else {
            String::new()
        };
        content.push_str(&format!(
            "<tr><td>{} ({})</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&user.display_name),
            escape(&user.username),
            escape(&user.email),
            user.role,
            user.thread_count,
            user.post_count,
            role_form,
        ));
    }
    content.push_str("</table>");
    Ok(console_page("Users", &session, &content).into_response())
}

fn role_options(current: Role) -> String {
    [Role::Member, Role::Moderator, Role::Admin]
        .iter()
        .map(|r| {
            let selected = if *r == current { " selected" } else { "" };
            format!(r#"<option value="{r}"{selected}>{r}</option>"#)
        })
        .collect()
}

#[derive(Deserialize)]
pub struct SetRoleForm {
    pub role: Role,
}

pub async fn set_role(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<SetRoleForm>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let updated = state
        .api_for(&session)
        .set_user_role(id, &SetRoleRequest { role: form.role })
        .await?;
    info!(
        "{} ({}) set role of {} to {}",
        session.username, session.user_id, updated.username, updated.role
    );
    Ok(Redirect::to("/admin/users").into_response())
}

pub async fn threads(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let page = state.api_for(&session).admin_threads(query.page.unwrap_or(1)).await?;
    let mut content = String::from(
        "<table><tr><th>Thread</th><th>Author</th><th>Status</th><th>Actions</th></tr>",
    );
    for thread in &page.items {
        let pin_label = if thread.pinned { "Unpin" } else { "Pin" };
        let lock_label = if thread.locked { "Unlock" } else { "Lock" };
        content.push_str(&format!(
            r#"<tr>
<td><a href="/threads/{id}">{title}</a></td>
<td>{author}</td>
<td>{status:?}</td>
<td>
<form method="post" action="/admin/threads/{id}/pin" class="inline"><input type="hidden" name="pinned" value="{pin_to}"><button type="submit">{pin_label}</button></form>
<form method="post" action="/admin/threads/{id}/lock" class="inline"><input type="hidden" name="locked" value="{lock_to}"><button type="submit">{lock_label}</button></form>
<form method="post" action="/admin/threads/{id}/remove" class="inline"><button type="submit">Remove</button></form>
</td>
</tr>"#,
            id = thread.id,
            title = escape(&thread.title),
            author = escape(&thread.author.username),
            status = thread.status,
            pin_to = !thread.pinned,
            lock_to = !thread.locked,
        ));
    }
    content.push_str("</table>");
    Ok(console_page("Threads", &session, &content).into_response())
}

#[derive(Deserialize)]
pub struct PinForm {
    pub pinned: bool,
}

pub async fn pin_thread(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<PinForm>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    state.api_for(&session).set_thread_pinned(id, form.pinned).await?;
    Ok(Redirect::to("/admin/threads").into_response())
}

#[derive(Deserialize)]
pub struct LockForm {
    pub locked: bool,
}

pub async fn lock_thread(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<LockForm>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    state.api_for(&session).set_thread_locked(id, form.locked).await?;
    Ok(Redirect::to("/admin/threads").into_response())
}

pub async fn remove_thread(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    state.api_for(&session).remove_thread(id).await?;
    info!("{} ({}) removed thread {}", session.username, session.user_id, id);
    Ok(Redirect::to("/admin/threads").into_response())
}

pub async fn posts(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let page = state.api_for(&session).admin_posts(query.page.unwrap_or(1)).await?;
    let mut content =
        String::from("<table><tr><th>Post</th><th>Author</th><th>Thread</th><th></th></tr>");
    for post in &page.items {
        let preview: String = post.content.chars().take(80).collect();
        content.push_str(&format!(
            r#"<tr>
<td>{preview}</td>
<td>{author}</td>
<td><a href="/threads/{thread_id}">view</a></td>
<td><form method="post" action="/admin/posts/{id}/remove" class="inline"><button type="submit">Remove</button></form></td>
</tr>"#,
            preview = escape(&preview),
            author = escape(&post.author.username),
            thread_id = post.thread_id,
            id = post.id,
        ));
    }
    content.push_str("</table>");
    Ok(console_page("Posts", &session, &content).into_response())
}

pub async fn remove_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    state.api_for(&session).remove_post(id).await?;
    info!("{} ({}) removed post {}", session.username, session.user_id, id);
    Ok(Redirect::to("/admin/posts").into_response())
}

pub async fn reports(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let page = state.api_for(&session).list_reports(query.page.unwrap_or(1)).await?;
    let mut content = String::from(
        "<table><tr><th>Reporter</th><th>Target</th><th>Reason</th><th>Status</th><th></th></tr>",
    );
    for report in &page.items {
        let target = match (report.thread_id, report.post_id) {
            (Some(tid), _) => format!(r#"<a href="/threads/{tid}">thread</a>"#),
            (None, Some(_)) => "post".to_string(),
            (None, None) => "-".to_string(),
        };
        let actions = if report.status == ReportStatus::Open {
            format!(
                r#"<form method="post" action="/admin/reports/{id}/resolve" class="inline"><input type="hidden" name="status" value="resolved"><button type="submit">Resolve</button></form>
<form method="post" action="/admin/reports/{id}/resolve" class="inline"><input type="hidden" name="status" value="dismissed"><button type="submit">Dismiss</button></form>"#,
                id = report.id,
            )
        } else {
            String::new()
        };
        content.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:?}</td><td>{}</td></tr>",
            escape(&report.reporter.username),
            target,
            escape(&report.reason),
            report.status,
            actions,
        ));
    }
    content.push_str("</table>");
    Ok(console_page("Reports", &session, &content).into_response())
}

#[derive(Deserialize)]
pub struct ResolveForm {
    pub status: ReportStatus,
    pub note: Option<String>,
}

pub async fn resolve_report(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<ResolveForm>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let req = ResolveReportRequest {
        status: form.status,
        note: form.note.filter(|n| !n.trim().is_empty()),
    };
    state.api_for(&session).resolve_report(id, &req).await?;
    info!("{} ({}) resolved report {}", session.username, session.user_id, id);
    Ok(Redirect::to("/admin/reports").into_response())
}

pub async fn moderation(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let page = state.api_for(&session).moderation_log(query.page.unwrap_or(1)).await?;
    let mut content = String::from(
        "<table><tr><th>When</th><th>Moderator</th><th>Action</th><th>Target</th></tr>",
    );
    for action in &page.items {
        content.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            render::format_time(&action.created_at),
            escape(&action.moderator.username),
            escape(&action.action),
            escape(&action.target),
        ));
    }
    content.push_str("</table>");
    Ok(console_page("Moderation log", &session, &content).into_response())
}

pub async fn analytics(State(state): State<AppState>, jar: CookieJar) -> PageResult<Response> {
    let session = match staff_session(&jar) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };

    let summary = state.api_for(&session).analytics_summary().await?;
    let content = format!(
        r#"<table>
<tr><th>Users</th><td>{}</td></tr>
<tr><th>Threads</th><td>{}</td></tr>
<tr><th>Posts</th><td>{}</td></tr>
<tr><th>Open reports</th><td>{}</td></tr>
<tr><th>Active today</th><td>{}</td></tr>
</table>"#,
        summary.user_count,
        summary.thread_count,
        summary.post_count,
        summary.open_reports,
        summary.active_today,
    );
    Ok(console_page("Analytics", &session, &content).into_response())
}

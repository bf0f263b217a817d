use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::error::PageResult;
use crate::render;
use crate::session::session_from_jar;
use crate::state::AppState;

/// Notification center. The fetched list seeds the live mirror, which keeps
/// the page's data current between navigations.
pub async fn list(State(state): State<AppState>, jar: CookieJar) -> PageResult<Response> {
    let Some(session) = session_from_jar(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };

    let entry = state.registry.ensure(&session).await;
    let fetched = state.api_for(&session).list_notifications().await?;
    entry.live.seed_notifications(fetched.notifications, fetched.unread);

    let notifications = entry.live.notifications();
    let unread = entry.live.unread();

    let mut body = format!("<h1>Notifications</h1><p>{unread} unread</p>");
    if unread > 0 {
        body.push_str(
            r#"<form method="post" action="/notifications/read-all"><button type="submit">Mark all read</button></form>"#,
        );
    }
    if notifications.is_empty() {
        body.push_str("<p>Nothing here yet.</p>");
    } else {
        body.push_str(r#"<ul class="notifications">"#);
        for n in &notifications {
            body.push_str(&render::notification_item(n));
        }
        body.push_str("</ul>");
    }

    Ok(Html(render::layout("Notifications", Some(&session), &body)).into_response())
}

/// Mark one notification read. The mirror is updated first so the page
/// reflects the change immediately; the backend confirmation runs in the
/// background and a failure only logs (the next fetch re-syncs).
pub async fn mark_read(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(session) = session_from_jar(&jar) else {
        return Redirect::to("/login").into_response();
    };

    if let Some(entry) = state.registry.get(session.user_id).await {
        entry.live.mark_read_local(id);
    }

    let api = state.api_for(&session);
    tokio::spawn(async move {
        if let Err(err) = api.mark_read(id).await {
            warn!("mark-read confirmation failed for {}: {}", id, err);
        }
    });

    Redirect::to("/notifications").into_response()
}

pub async fn mark_all_read(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(session) = session_from_jar(&jar) else {
        return Redirect::to("/login").into_response();
    };

    if let Some(entry) = state.registry.get(session.user_id).await {
        entry.live.mark_all_read_local();
    }

    let api = state.api_for(&session);
    tokio::spawn(async move {
        if let Err(err) = api.mark_all_read().await {
            warn!("mark-all-read confirmation failed: {}", err);
        }
    });

    Redirect::to("/notifications").into_response()
}

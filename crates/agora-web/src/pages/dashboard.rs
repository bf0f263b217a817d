use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::error::PageResult;
use crate::render::{self, escape};
use crate::session::session_from_jar;
use crate::state::AppState;

/// Member dashboard: own threads, unread counter, channel health.
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> PageResult<Response> {
    let Some(session) = session_from_jar(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };

    let entry = state.registry.ensure(&session).await;
    let api = state.api_for(&session);
    let mine = api.my_threads(1).await?;
    let unread = api.unread_count().await?;

    let mut body = format!("<h1>Welcome back, {}</h1>", escape(&session.display_name));
    body.push_str(&render::realtime_banner(entry.channel.is_connected()));
    body.push_str(&format!(
        r#"<p><a href="/notifications">{} unread notifications</a></p>"#,
        unread.unread,
    ));

    body.push_str("<section><h2>Your threads</h2>");
    if mine.items.is_empty() {
        body.push_str(r#"<p>You have not started any threads. <a href="/threads/new">Start one</a>.</p>"#);
    } else {
        for thread in &mine.items {
            body.push_str(&render::thread_card(thread));
        }
    }
    body.push_str("</section>");

    Ok(Html(render::layout("Dashboard", Some(&session), &body)).into_response())
}

use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::cookie::CookieJar;

use crate::error::PageResult;
use crate::render;
use crate::session::session_from_jar;
use crate::state::AppState;

/// Landing page: pinned threads first, then recent activity.
pub async fn home(State(state): State<AppState>, jar: CookieJar) -> PageResult<Html<String>> {
    let session = session_from_jar(&jar);
    let page = state.api().list_threads(1, 20).await?;

    let (pinned, recent): (Vec<_>, Vec<_>) = page.items.iter().partition(|t| t.pinned);

    let mut body = String::from("<h1>Agora</h1>");
    if !pinned.is_empty() {
        body.push_str("<section><h2>Pinned</h2>");
        for thread in pinned {
            body.push_str(&render::thread_card(thread));
        }
        body.push_str("</section>");
    }
    body.push_str("<section><h2>Recent threads</h2>");
    for thread in recent {
        body.push_str(&render::thread_card(thread));
    }
    body.push_str(r#"</section><p><a href="/threads">Browse all threads</a></p>"#);

    Ok(Html(render::layout("Home", session.as_ref(), &body)))
}

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use agora_types::api::{CreatePostRequest, CreateThreadRequest};
use agora_types::models::{Post, Session, Thread};

use crate::error::PageResult;
use crate::render::{self, escape};
use crate::session::session_from_jar;
use crate::state::AppState;
use crate::validate;

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
}

/// Thread listing. The fetched page is overlaid with whatever the live
/// mirror has seen since, so a thread created elsewhere shows up without a
/// refresh on the next navigation.
pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> PageResult<Html<String>> {
    let session = session_from_jar(&jar);
    let page_num = query.page.unwrap_or(1).max(1);
    let page = state.api().list_threads(page_num, 20).await?;

    let threads = match &session {
        Some(s) => match state.registry.get(s.user_id).await {
            Some(entry) => merge_threads(page.items, entry.live.threads()),
            None => page.items,
        },
        None => page.items,
    };

    let mut body = String::from("<h1>Threads</h1>");
    if session.is_some() {
        body.push_str(r#"<p><a href="/threads/new">Start a thread</a></p>"#);
    }
    for thread in &threads {
        body.push_str(&render::thread_card(thread));
    }
    body.push_str(&pagination(page_num, page.per_page, page.total, "/threads"));

    Ok(Html(render::layout("Threads", session.as_ref(), &body)))
}

/// Thread detail with its posts, live replies merged in.
pub async fn detail(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> PageResult<Html<String>> {
    let session = session_from_jar(&jar);
    let detail = state.api().get_thread(id).await?;

    let posts = match &session {
        Some(s) => match state.registry.get(s.user_id).await {
            Some(entry) => merge_posts(detail.posts, entry.live.posts_for(id)),
            None => detail.posts,
        },
        None => detail.posts,
    };

    Ok(Html(render_detail(&detail.thread, &posts, session.as_ref(), &[])))
}

pub async fn new_form(jar: CookieJar) -> Html<String> {
    let session = session_from_jar(&jar);
    Html(render_new_form(session.as_ref(), "", "", "", &[]))
}

#[derive(Deserialize)]
pub struct NewThreadForm {
    pub title: String,
    pub content: String,
    pub tags: Option<String>,
}

/// Create a thread. Validation runs before any request leaves; a failed
/// field re-renders the form with the submitted values intact.
pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NewThreadForm>,
) -> PageResult<Response> {
    let Some(session) = session_from_jar(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };

    let tags_raw = form.tags.clone().unwrap_or_default();
    let errors = validate::validate_thread(&form.title, &form.content);
    if !errors.is_empty() {
        return Ok(Html(render_new_form(
            Some(&session),
            &form.title,
            &form.content,
            &tags_raw,
            &errors,
        ))
        .into_response());
    }

    let tags: Vec<String> = tags_raw
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let req = CreateThreadRequest {
        title: form.title.trim().to_string(),
        content: form.content.trim().to_string(),
        tags,
    };

    let thread = state.api_for(&session).create_thread(&req).await?;
    info!("{} ({}) created thread {}", session.username, session.user_id, thread.id);
    Ok(Redirect::to(&format!("/threads/{}", thread.id)).into_response())
}

#[derive(Deserialize)]
pub struct ReplyForm {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

pub async fn reply(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Form(form): Form<ReplyForm>,
) -> PageResult<Response> {
    let Some(session) = session_from_jar(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };

    let errors = validate::validate_reply(&form.content);
    if !errors.is_empty() {
        let detail = state.api().get_thread(id).await?;
        return Ok(
            Html(render_detail(&detail.thread, &detail.posts, Some(&session), &errors))
                .into_response(),
        );
    }

    let req = CreatePostRequest {
        content: form.content.trim().to_string(),
        parent_id: form.parent_id,
    };
    state.api_for(&session).create_post(id, &req).await?;
    Ok(Redirect::to(&format!("/threads/{id}")).into_response())
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

pub async fn search(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<SearchQuery>,
) -> PageResult<Html<String>> {
    let session = session_from_jar(&jar);
    let q = query.q.unwrap_or_default();

    let mut body = String::from("<h1>Search</h1>");
    body.push_str(&format!(
        r#"<form method="get" action="/search">
<input name="q" value="{}" placeholder="Search threads" required>
<button type="submit">Search</button>
</form>"#,
        escape(&q),
    ));

    if !q.trim().is_empty() {
        let page_num = query.page.unwrap_or(1).max(1);
        let page = state.api().search_threads(q.trim(), page_num).await?;
        body.push_str(&format!("<p>{} results</p>", page.total));
        for thread in &page.items {
            body.push_str(&render::thread_card(thread));
        }
    }

    Ok(Html(render::layout("Search", session.as_ref(), &body)))
}

// -- merging --

/// Overlay live-mirror threads onto a fetched page, live entries first and
/// newer data winning by id.
fn merge_threads(fetched: Vec<Thread>, live: Vec<Thread>) -> Vec<Thread> {
    let mut merged = live;
    for thread in fetched {
        if !merged.iter().any(|t| t.id == thread.id) {
            merged.push(thread);
        }
    }
    merged
}

fn merge_posts(fetched: Vec<Post>, live: Vec<Post>) -> Vec<Post> {
    let mut merged = fetched;
    for post in live {
        if let Some(existing) = merged.iter_mut().find(|p| p.id == post.id) {
            *existing = post;
        } else {
            merged.push(post);
        }
    }
    merged
}

// -- rendering --

fn render_detail(
    thread: &Thread,
    posts: &[Post],
    session: Option<&Session>,
    errors: &[validate::FieldError],
) -> String {
    let mut body = String::new();
    if thread.pinned {
        body.push_str(r#"<span class="badge">Pinned</span> "#);
    }
    if thread.locked {
        body.push_str(r#"<span class="badge">Locked</span> "#);
    }
    body.push_str(&format!(
        r#"<h1>{title}</h1>
<p class="meta">by {author} on {created} &middot; {views} views</p>
<div class="content">{content}</div>"#,
        title = escape(&thread.title),
        author = escape(&thread.author.display_name),
        created = render::format_time(&thread.created_at),
        views = thread.view_count,
        content = escape(&thread.content),
    ));

    body.push_str(&format!("<section id=\"posts\"><h2>{} posts</h2>", posts.len()));
    for post in posts {
        body.push_str(&render::post_item(post));
    }
    body.push_str("</section>");

    match session {
        Some(_) if !thread.locked => {
            for e in errors {
                body.push_str(&render::banner(&e.message));
            }
            body.push_str(&format!(
                r#"<form method="post" action="/threads/{}/reply">
<label>Reply <textarea name="content" required></textarea></label>
<button type="submit">Post reply</button>
</form>"#,
                thread.id,
            ));
            // Live updates for this thread while the page is open
            body.push_str(&format!(
                r#"<script>
const es = new EventSource("/threads/{}/events");
es.onmessage = () => window.location.reload();
</script>"#,
                thread.id,
            ));
        }
        Some(_) => {
            body.push_str("<p>This thread is locked.</p>");
        }
        None => {
            body.push_str(r#"<p><a href="/login">Sign in</a> to reply.</p>"#);
        }
    }

    render::layout(&thread.title, session, &body)
}

fn render_new_form(
    session: Option<&Session>,
    title: &str,
    content: &str,
    tags: &str,
    errors: &[validate::FieldError],
) -> String {
    let mut body = String::from("<h1>Start a thread</h1>");
    for e in errors {
        body.push_str(&render::banner(&e.message));
    }
    body.push_str(&format!(
        r#"<form method="post" action="/threads/new">
<label>Title <input name="title" value="{title}" required></label>
<label>Content <textarea name="content" required>{content}</textarea></label>
<label>Tags <input name="tags" value="{tags}" placeholder="comma, separated"></label>
<button type="submit">Publish</button>
</form>"#,
        title = escape(title),
        content = escape(content),
        tags = escape(tags),
    ));
    render::layout("New thread", session, &body)
}

/// Prev/next links when the listing spans more than one page.
fn pagination(page: u32, per_page: u32, total: u64, base: &str) -> String {
    let pages = if per_page == 0 { 1 } else { total.div_ceil(per_page as u64).max(1) };
    if pages <= 1 {
        return String::new();
    }
    let mut out = String::from(r#"<nav class="pagination">"#);
    if page > 1 {
        out.push_str(&format!(r#"<a href="{base}?page={}">Previous</a> "#, page - 1));
    }
    out.push_str(&format!("Page {page} of {pages}"));
    if (page as u64) < pages {
        out.push_str(&format!(r#" <a href="{base}?page={}">Next</a>"#, page + 1));
    }
    out.push_str("</nav>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::models::{Author, ThreadStatus};
    use chrono::Utc;

    fn thread(id: Uuid, title: &str) -> Thread {
        Thread {
            id,
            title: title.into(),
            content: "body".into(),
            author: Author {
                id: Uuid::new_v4(),
                username: "ada".into(),
                display_name: "Ada".into(),
            },
            tags: vec![],
            view_count: 0,
            post_count: 0,
            pinned: false,
            locked: false,
            status: ThreadStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn merge_prefers_live_entries_and_never_duplicates() {
        let shared = Uuid::new_v4();
        let fetched = vec![thread(shared, "stale"), thread(Uuid::new_v4(), "fetched-only")];
        let live = vec![thread(shared, "fresh"), thread(Uuid::new_v4(), "live-only")];

        let merged = merge_threads(fetched, live);
        assert_eq!(merged.len(), 3);
        let updated = merged.iter().find(|t| t.id == shared).unwrap();
        assert_eq!(updated.title, "fresh");
    }

    #[test]
    fn pagination_renders_only_when_needed() {
        assert_eq!(pagination(1, 20, 10, "/threads"), "");
        let nav = pagination(2, 20, 100, "/threads");
        assert!(nav.contains("Page 2 of 5"));
        assert!(nav.contains("?page=1"));
        assert!(nav.contains("?page=3"));
    }
}

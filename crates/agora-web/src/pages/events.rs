use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use futures_util::Stream;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use agora_types::events::ChannelEvent;

use crate::session::session_from_jar;
use crate::state::AppState;

/// Bridge the session's realtime channel to the browser as an SSE stream.
/// All account-level events flow through; `Ready` is internal and skipped.
pub async fn global_events(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(session) = session_from_jar(&jar) else {
        return Redirect::to("/login").into_response();
    };

    let entry = state.registry.ensure(&session).await;
    let rx = entry.channel.subscribe();

    let stream = event_stream(rx);
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

/// Thread-scoped SSE stream. Opening it joins the thread's room; the
/// membership lasts exactly as long as the browser keeps the stream open,
/// because the room guard lives inside the stream and leaves on drop.
pub async fn thread_events(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(session) = session_from_jar(&jar) else {
        return Redirect::to("/login").into_response();
    };

    let entry = state.registry.ensure(&session).await;
    let guard = entry.channel.room_guard(id);
    let rx = entry.channel.subscribe();

    let stream = async_stream::stream! {
        // Room membership is tied to the stream's lifetime
        let _guard = guard;
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(ev) if concerns_thread(&ev, id) => {
                    if let Some(event) = to_sse_event(&ev) {
                        yield Ok::<Event, Infallible>(event);
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("sse bridge lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("thread event stream for {} closed", id);
    };

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

fn event_stream(
    rx: broadcast::Receiver<ChannelEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(ChannelEvent::Ready { .. }) => {}
                Ok(ev) => {
                    if let Some(event) = to_sse_event(&ev) {
                        yield Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("sse bridge lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Whether an event belongs on a thread-scoped stream.
fn concerns_thread(ev: &ChannelEvent, id: Uuid) -> bool {
    if ev.thread_id() == Some(id) {
        return true;
    }
    match ev {
        ChannelEvent::ThreadUpdated { thread } => thread.id == id,
        ChannelEvent::ThreadDeleted { thread_id } => *thread_id == id,
        _ => false,
    }
}

fn to_sse_event(ev: &ChannelEvent) -> Option<Event> {
    match serde_json::to_string(ev) {
        Ok(json) => Some(Event::default().data(json)),
        Err(err) => {
            warn!("failed to serialize channel event: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::models::{Author, Post, Thread, ThreadStatus};
    use chrono::Utc;

    fn post(thread_id: Uuid) -> Post {
        Post {
            id: Uuid::new_v4(),
            thread_id,
            parent_id: None,
            content: "hi".into(),
            author: Author {
                id: Uuid::new_v4(),
                username: "ada".into(),
                display_name: "Ada".into(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn thread(id: Uuid) -> Thread {
        Thread {
            id,
            title: "t".into(),
            content: "c".into(),
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
    fn thread_stream_filter_scopes_post_events() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(concerns_thread(&ChannelEvent::PostCreated { post: post(id) }, id));
        assert!(!concerns_thread(&ChannelEvent::PostCreated { post: post(other) }, id));
        assert!(concerns_thread(&ChannelEvent::ThreadDeleted { thread_id: id }, id));
        assert!(concerns_thread(&ChannelEvent::ThreadUpdated { thread: thread(id) }, id));
        assert!(!concerns_thread(
            &ChannelEvent::NotificationRead { notification_id: Uuid::new_v4() },
            id
        ));
    }
}

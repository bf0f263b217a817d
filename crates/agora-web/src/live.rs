use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use agora_realtime::RealtimeChannel;
use agora_types::events::ChannelEvent;
use agora_types::models::{Notification, Post, Thread};

/// Per-session mirror of push-updated state. Views render fetched snapshots
/// and overlay whatever this mirror has seen since. Inserts are deduplicated
/// by id, so an event observed again after a reconnect never duplicates an
/// entry; no ordering is enforced beyond arrival order, and a stale patch
/// may overwrite newer fetched data until the next fetch.
#[derive(Clone)]
pub struct LiveUpdates {
    inner: Arc<Mutex<LiveInner>>,
}

#[derive(Default)]
struct LiveInner {
    threads: Vec<Thread>,
    posts: HashMap<Uuid, Vec<Post>>,
    notifications: Vec<Notification>,
    unread: u64,
}

impl LiveUpdates {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(LiveInner::default())) }
    }

    /// Consume the channel's broadcast stream until the channel closes.
    pub fn spawn_apply_task(&self, channel: &RealtimeChannel) -> tokio::task::JoinHandle<()> {
        let live = self.clone();
        let mut rx = channel.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => live.apply(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("live mirror lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn apply(&self, event: ChannelEvent) {
        let mut inner = self.inner.lock().expect("live mirror lock poisoned");
        match event {
            ChannelEvent::Ready { .. } => {}

            ChannelEvent::ThreadCreated { thread } | ChannelEvent::ThreadUpdated { thread } => {
                upsert_thread(&mut inner.threads, thread);
            }
            ChannelEvent::ThreadDeleted { thread_id } => {
                inner.threads.retain(|t| t.id != thread_id);
                inner.posts.remove(&thread_id);
            }

            ChannelEvent::PostCreated { post } => {
                let posts = inner.posts.entry(post.thread_id).or_default();
                if posts.iter().any(|p| p.id == post.id) {
                    debug!("duplicate post event ignored: {}", post.id);
                } else {
                    posts.push(post);
                }
            }
            ChannelEvent::PostUpdated { post } => {
                if let Some(posts) = inner.posts.get_mut(&post.thread_id) {
                    if let Some(existing) = posts.iter_mut().find(|p| p.id == post.id) {
                        *existing = post;
                    } else {
                        posts.push(post);
                    }
                }
            }
            ChannelEvent::PostDeleted { post_id, thread_id } => {
                if let Some(posts) = inner.posts.get_mut(&thread_id) {
                    posts.retain(|p| p.id != post_id);
                }
            }

            ChannelEvent::NotificationCreated { notification } => {
                if inner.notifications.iter().any(|n| n.id == notification.id) {
                    debug!("duplicate notification event ignored: {}", notification.id);
                } else {
                    if !notification.is_read {
                        inner.unread += 1;
                    }
                    inner.notifications.insert(0, notification);
                }
            }
            ChannelEvent::NotificationRead { notification_id } => {
                mark_read(&mut inner, notification_id);
            }
        }
    }

    /// Replace the mirrored notifications with a fetched snapshot.
    pub fn seed_notifications(&self, notifications: Vec<Notification>, unread: u64) {
        let mut inner = self.inner.lock().expect("live mirror lock poisoned");
        inner.notifications = notifications;
        inner.unread = unread;
    }

    /// Optimistic local mark-read. Idempotent: marking an already-read
    /// notification leaves it read and does not touch the counter again.
    pub fn mark_read_local(&self, id: Uuid) {
        let mut inner = self.inner.lock().expect("live mirror lock poisoned");
        mark_read(&mut inner, id);
    }

    pub fn mark_all_read_local(&self) {
        let mut inner = self.inner.lock().expect("live mirror lock poisoned");
        for n in inner.notifications.iter_mut() {
            if !n.is_read {
                n.is_read = true;
                n.read_at = Some(chrono::Utc::now());
            }
        }
        inner.unread = 0;
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.inner.lock().expect("live mirror lock poisoned").threads.clone()
    }

    pub fn posts_for(&self, thread_id: Uuid) -> Vec<Post> {
        self.inner
            .lock()
            .expect("live mirror lock poisoned")
            .posts
            .get(&thread_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().expect("live mirror lock poisoned").notifications.clone()
    }

    pub fn unread(&self) -> u64 {
        self.inner.lock().expect("live mirror lock poisoned").unread
    }
}

impl Default for LiveUpdates {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert_thread(threads: &mut Vec<Thread>, thread: Thread) {
    if let Some(existing) = threads.iter_mut().find(|t| t.id == thread.id) {
        *existing = thread;
    } else {
        threads.insert(0, thread);
    }
}

fn mark_read(inner: &mut LiveInner, id: Uuid) {
    if let Some(n) = inner.notifications.iter_mut().find(|n| n.id == id) {
        if !n.is_read {
            n.is_read = true;
            n.read_at = Some(chrono::Utc::now());
            inner.unread = inner.unread.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::models::{Author, NotificationKind, ThreadStatus};
    use chrono::Utc;

    fn author() -> Author {
        Author { id: Uuid::new_v4(), username: "ada".into(), display_name: "Ada".into() }
    }

    fn thread(id: Uuid, title: &str) -> Thread {
        Thread {
            id,
            title: title.into(),
            content: "body".into(),
            author: author(),
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

    fn post(id: Uuid, thread_id: Uuid) -> Post {
        Post {
            id,
            thread_id,
            parent_id: None,
            content: "hi".into(),
            author: author(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn notification(id: Uuid, is_read: bool) -> Notification {
        Notification {
            id,
            kind: NotificationKind::Reply,
            title: "New reply".into(),
            message: "someone replied".into(),
            link: None,
            is_read,
            created_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn replayed_events_after_reconnect_do_not_duplicate_entries() {
        let live = LiveUpdates::new();
        let tid = Uuid::new_v4();
        let pid = Uuid::new_v4();

        live.apply(ChannelEvent::ThreadCreated { thread: thread(tid, "once") });
        live.apply(ChannelEvent::PostCreated { post: post(pid, tid) });

        // Same entities observed again after a disconnect/reconnect
        live.apply(ChannelEvent::ThreadCreated { thread: thread(tid, "once") });
        live.apply(ChannelEvent::PostCreated { post: post(pid, tid) });

        assert_eq!(live.threads().len(), 1);
        assert_eq!(live.posts_for(tid).len(), 1);
    }

    #[test]
    fn thread_update_patches_in_place() {
        let live = LiveUpdates::new();
        let tid = Uuid::new_v4();
        live.apply(ChannelEvent::ThreadCreated { thread: thread(tid, "before") });

        let mut updated = thread(tid, "after");
        updated.pinned = true;
        live.apply(ChannelEvent::ThreadUpdated { thread: updated });

        let threads = live.threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].title, "after");
        assert!(threads[0].pinned);
    }

    #[test]
    fn deleting_a_thread_drops_its_posts() {
        let live = LiveUpdates::new();
        let tid = Uuid::new_v4();
        live.apply(ChannelEvent::ThreadCreated { thread: thread(tid, "t") });
        live.apply(ChannelEvent::PostCreated { post: post(Uuid::new_v4(), tid) });
        live.apply(ChannelEvent::ThreadDeleted { thread_id: tid });

        assert!(live.threads().is_empty());
        assert!(live.posts_for(tid).is_empty());
    }

    #[test]
    fn mark_read_is_idempotent() {
        let live = LiveUpdates::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        live.seed_notifications(vec![notification(a, false), notification(b, false)], 2);

        live.mark_read_local(a);
        assert_eq!(live.unread(), 1);

        // Marking the same notification again must not decrement twice
        live.mark_read_local(a);
        assert_eq!(live.unread(), 1);
        let read = live.notifications().into_iter().find(|n| n.id == a).unwrap();
        assert!(read.is_read);
    }

    #[test]
    fn duplicate_notification_event_does_not_bump_the_counter_twice() {
        let live = LiveUpdates::new();
        let n = notification(Uuid::new_v4(), false);
        live.apply(ChannelEvent::NotificationCreated { notification: n.clone() });
        live.apply(ChannelEvent::NotificationCreated { notification: n });
        assert_eq!(live.unread(), 1);
        assert_eq!(live.notifications().len(), 1);
    }

    #[test]
    fn remote_notification_read_event_syncs_the_counter() {
        let live = LiveUpdates::new();
        let id = Uuid::new_v4();
        live.apply(ChannelEvent::NotificationCreated { notification: notification(id, false) });
        assert_eq!(live.unread(), 1);
        live.apply(ChannelEvent::NotificationRead { notification_id: id });
        assert_eq!(live.unread(), 0);
    }
}

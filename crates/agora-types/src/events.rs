use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Notification, Post, Thread};

/// Events pushed by the gateway to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChannelEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid, username: String },

    /// A new thread was created
    ThreadCreated { thread: Thread },

    /// An existing thread changed (title, counts, pinned/locked flags, status)
    ThreadUpdated { thread: Thread },

    /// A thread was removed
    ThreadDeleted { thread_id: Uuid },

    /// A new post was published in a thread
    PostCreated { post: Post },

    /// An existing post was edited
    PostUpdated { post: Post },

    /// A post was removed from a thread
    PostDeleted { post_id: Uuid, thread_id: Uuid },

    /// A notification was created for this session's user
    NotificationCreated { notification: Notification },

    /// A notification was marked read (possibly from another tab/device)
    NotificationRead { notification_id: Uuid },
}

impl ChannelEvent {
    /// Returns the thread id if this event is scoped to a thread room.
    /// Events that return `None` are global and delivered to every subscriber.
    pub fn thread_id(&self) -> Option<Uuid> {
        match self {
            Self::PostCreated { post } => Some(post.thread_id),
            Self::PostUpdated { post } => Some(post.thread_id),
            Self::PostDeleted { thread_id, .. } => Some(*thread_id),
            // Ready, Thread*, Notification* are global
            _ => None,
        }
    }
}

/// Commands sent FROM client TO the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChannelCommand {
    /// Authenticate the connection. Must be the first frame.
    Identify { token: String },

    /// Enter a thread room to receive its post events
    JoinThread { thread_id: Uuid },

    /// Leave a thread room
    LeaveThread { thread_id: Uuid },
}

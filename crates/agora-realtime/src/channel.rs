use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agora_types::events::{ChannelCommand, ChannelEvent};

/// Connection lifecycle as seen by consumers. The run loop cycles
/// `Connecting -> Connected -> Connecting ...` through automatic retries and
/// lands on `Disconnected` permanently once the retry budget is spent or the
/// owner calls `disconnect()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

/// Tunables for the connection loop. Defaults match production; tests dial
/// the delays down.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Consecutive failed connection attempts before giving up.
    pub reconnect_attempts: u32,
    /// Fixed backoff between attempts. Deliberately not adaptive.
    pub reconnect_delay: Duration,
    /// How long to wait for the server's Ready after Identify.
    pub ready_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(3),
            ready_timeout: Duration::from_secs(10),
        }
    }
}

enum Request {
    Command(ChannelCommand),
    Shutdown,
}

enum SessionEnd {
    /// Transport dropped; the outer loop decides whether to retry.
    ConnectionLost,
    /// Owner asked for teardown; no retry.
    Shutdown,
}

struct Inner {
    events_tx: broadcast::Sender<ChannelEvent>,
    state_tx: watch::Sender<ChannelState>,
    requests_tx: mpsc::UnboundedSender<Request>,
    /// Rooms currently joined, duplicates included — overlapping joins are
    /// not deduplicated, each mount/unmount pair is independent. Re-issued
    /// after a reconnect (membership is client state; events are not).
    rooms: Mutex<Vec<Uuid>>,
}

/// Handle on the single per-session gateway connection. Cheap to clone; the
/// owner that called `connect` is the only component that may `disconnect`.
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<Inner>,
}

impl RealtimeChannel {
    /// Open the connection and spawn its run loop. Authentication happens by
    /// sending `Identify { token }` as the first frame of every session.
    pub fn connect(gateway_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::connect_with(gateway_url, token, ChannelConfig::default())
    }

    pub fn connect_with(
        gateway_url: impl Into<String>,
        token: impl Into<String>,
        config: ChannelConfig,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(1024);
        let (state_tx, _) = watch::channel(ChannelState::Connecting);
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            events_tx,
            state_tx,
            requests_tx,
            rooms: Mutex::new(Vec::new()),
        });

        let loop_inner = inner.clone();
        let url = gateway_url.into();
        let token = token.into();
        tokio::spawn(async move {
            run_loop(loop_inner, url, token, config, requests_rx).await;
        });

        Self { inner }
    }

    /// Receive a copy of every event this session gets from the gateway.
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.inner.events_tx.subscribe()
    }

    pub fn state(&self) -> ChannelState {
        *self.inner.state_tx.borrow()
    }

    /// The only signal consumers get about connection health.
    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    /// Watch for state transitions (e.g. to toggle the "real-time updates
    /// unavailable" banner).
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.inner.state_tx.subscribe()
    }

    /// Enter a thread room. Always sends — joins are not deduplicated.
    pub fn join_thread(&self, thread_id: Uuid) {
        self.inner
            .rooms
            .lock()
            .expect("rooms lock poisoned")
            .push(thread_id);
        self.send_command(ChannelCommand::JoinThread { thread_id });
    }

    /// Leave a thread room, dropping one join.
    pub fn leave_thread(&self, thread_id: Uuid) {
        let mut rooms = self.inner.rooms.lock().expect("rooms lock poisoned");
        if let Some(pos) = rooms.iter().position(|id| *id == thread_id) {
            rooms.remove(pos);
        }
        drop(rooms);
        self.send_command(ChannelCommand::LeaveThread { thread_id });
    }

    /// Join a room for the lifetime of the returned guard; dropping it
    /// leaves. Backs the SSE bridge, where the stream's drop is the unmount.
    pub fn room_guard(&self, thread_id: Uuid) -> RoomGuard {
        self.join_thread(thread_id);
        RoomGuard { channel: self.clone(), thread_id }
    }

    /// Tear the connection down for good (logout). No reconnection follows.
    pub fn disconnect(&self) {
        let _ = self.inner.requests_tx.send(Request::Shutdown);
    }

    fn send_command(&self, cmd: ChannelCommand) {
        // Commands issued after the run loop ended (or while disconnected)
        // are dropped; a missed join only matters until the next page load.
        if self.inner.requests_tx.send(Request::Command(cmd)).is_err() {
            debug!("channel command dropped: run loop has exited");
        }
    }
}

/// RAII room membership. Leaves the thread room on drop.
pub struct RoomGuard {
    channel: RealtimeChannel,
    thread_id: Uuid,
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        self.channel.leave_thread(self.thread_id);
    }
}

/// Truncate for logging without splitting a multibyte character; slicing at
/// an arbitrary byte index would panic and take the run loop with it.
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

async fn run_loop(
    inner: Arc<Inner>,
    url: String,
    token: String,
    config: ChannelConfig,
    mut requests_rx: mpsc::UnboundedReceiver<Request>,
) {
    let mut attempts: u32 = 0;

    loop {
        inner.state_tx.send_replace(ChannelState::Connecting);

        match run_session(&inner, &url, &token, &config, &mut requests_rx).await {
            Ok(SessionEnd::Shutdown) => {
                info!("gateway channel closed by owner");
                break;
            }
            Ok(SessionEnd::ConnectionLost) => {
                // A session that reached Ready earns a fresh retry budget.
                attempts = 0;
                warn!("gateway connection lost, reconnecting");
            }
            Err(e) => {
                attempts += 1;
                warn!("gateway connect attempt {} failed: {}", attempts, e);
                if attempts >= config.reconnect_attempts {
                    warn!(
                        "gateway retry budget exhausted after {} attempts, giving up",
                        attempts
                    );
                    break;
                }
            }
        }

        // Fixed backoff; keep draining requests so Shutdown still works
        // while disconnected and stray commands are dropped, not queued.
        let deadline = tokio::time::Instant::now() + config.reconnect_delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                req = requests_rx.recv() => match req {
                    Some(Request::Shutdown) | None => {
                        inner.state_tx.send_replace(ChannelState::Disconnected);
                        return;
                    }
                    Some(Request::Command(_)) => {
                        debug!("command dropped while disconnected");
                    }
                },
            }
        }
    }

    inner.state_tx.send_replace(ChannelState::Disconnected);
}

/// One connected session: handshake, room re-join, then the select loop.
/// `Ok` means the session ended in an orderly way; `Err` means we never got
/// past the handshake (counts against the retry budget).
async fn run_session(
    inner: &Arc<Inner>,
    url: &str,
    token: &str,
    config: &ChannelConfig,
    requests_rx: &mut mpsc::UnboundedReceiver<Request>,
) -> Result<SessionEnd, String> {
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| format!("connect: {e}"))?;
    let (mut sender, mut receiver) = ws.split();

    // Handshake: Identify, then wait (bounded) for Ready.
    let identify = ChannelCommand::Identify { token: token.to_string() };
    let text = serde_json::to_string(&identify).map_err(|e| format!("encode identify: {e}"))?;
    sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| format!("send identify: {e}"))?;

    let ready = tokio::time::timeout(config.ready_timeout, async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(ev @ ChannelEvent::Ready { .. }) =
                    serde_json::from_str::<ChannelEvent>(&text)
                {
                    return Some(ev);
                }
            }
        }
        None
    })
    .await;

    let ready = match ready {
        Ok(Some(ev)) => ev,
        Ok(None) => return Err("gateway closed before Ready".into()),
        Err(_) => return Err("timed out waiting for Ready".into()),
    };

    if let ChannelEvent::Ready { user_id, username } = &ready {
        info!("{} ({}) connected to gateway", username, user_id);
    }
    let _ = inner.events_tx.send(ready);

    // Re-enter rooms joined before the drop. Events missed in between are
    // gone; only a full page re-fetch recovers them.
    let rooms: Vec<Uuid> = inner.rooms.lock().expect("rooms lock poisoned").clone();
    for thread_id in rooms {
        let cmd = ChannelCommand::JoinThread { thread_id };
        let text = serde_json::to_string(&cmd).map_err(|e| format!("encode join: {e}"))?;
        sender
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| format!("rejoin room: {e}"))?;
    }

    inner.state_tx.send_replace(ChannelState::Connected);

    loop {
        tokio::select! {
            req = requests_rx.recv() => {
                match req {
                    Some(Request::Command(cmd)) => {
                        let text = match serde_json::to_string(&cmd) {
                            Ok(t) => t,
                            Err(e) => {
                                warn!("failed to encode command: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            return Ok(SessionEnd::ConnectionLost);
                        }
                    }
                    Some(Request::Shutdown) | None => {
                        let _ = sender.send(Message::Close(None)).await;
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ChannelEvent>(&text) {
                            Ok(event) => {
                                // No receivers is fine — nothing is mounted.
                                let _ = inner.events_tx.send(event);
                            }
                            Err(e) => {
                                warn!(
                                    "bad gateway event: {} -- raw: {}",
                                    e,
                                    truncate_utf8(&text, 200)
                                );
                            }
                        }
                    }
                    // Pings are answered by the transport; binary is not
                    // part of this protocol.
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        return Ok(SessionEnd::ConnectionLost);
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

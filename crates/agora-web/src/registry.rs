use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use agora_realtime::{ChannelConfig, RealtimeChannel};
use agora_types::models::Session;

use crate::live::LiveUpdates;

/// A user's push connection and the state mirror fed from it.
#[derive(Clone)]
pub struct SessionChannel {
    pub channel: RealtimeChannel,
    pub live: LiveUpdates,
}

/// Owns one realtime channel per logged-in user. The registry is the only
/// place channels are created and torn down; pages borrow a handle but never
/// manage the connection themselves, so navigating cannot drop or double a
/// connection.
#[derive(Clone)]
pub struct ChannelRegistry {
    gateway_url: String,
    channels: Arc<RwLock<HashMap<Uuid, SessionChannel>>>,
}

impl ChannelRegistry {
    pub fn new(gateway_url: String) -> Self {
        Self { gateway_url, channels: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Get the user's channel, connecting one if none exists yet.
    pub async fn ensure(&self, session: &Session) -> SessionChannel {
        if let Some(existing) = self.channels.read().await.get(&session.user_id) {
            return existing.clone();
        }

        let mut channels = self.channels.write().await;
        // Another request may have connected while we waited for the lock
        if let Some(existing) = channels.get(&session.user_id) {
            return existing.clone();
        }

        info!("{} ({}) opening realtime channel", session.username, session.user_id);
        let channel = RealtimeChannel::connect_with(
            self.gateway_url.clone(),
            session.access_token.clone(),
            ChannelConfig::default(),
        );
        let live = LiveUpdates::new();
        let _ = live.spawn_apply_task(&channel);

        let entry = SessionChannel { channel, live };
        channels.insert(session.user_id, entry.clone());
        entry
    }

    pub async fn get(&self, user_id: Uuid) -> Option<SessionChannel> {
        self.channels.read().await.get(&user_id).cloned()
    }

    /// Tear down the user's channel (logout).
    pub async fn remove(&self, user_id: Uuid) {
        if let Some(entry) = self.channels.write().await.remove(&user_id) {
            info!("closing realtime channel for {}", user_id);
            entry.channel.disconnect();
        }
    }
}

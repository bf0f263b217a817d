use std::sync::Arc;

use agora_client::ApiClient;
use agora_types::models::Session;

use crate::config::Config;
use crate::registry::ChannelRegistry;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: ChannelRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = ChannelRegistry::new(config.gateway_url.clone());
        Self { config: Arc::new(config), registry }
    }

    /// Anonymous API client.
    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.config.api_base_url.clone())
    }

    /// API client carrying the session's bearer token.
    pub fn api_for(&self, session: &Session) -> ApiClient {
        ApiClient::new(self.config.api_base_url.clone()).with_token(session.access_token.clone())
    }
}

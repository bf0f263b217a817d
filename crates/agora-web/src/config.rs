/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend REST API, e.g. `http://localhost:4000`.
    pub api_base_url: String,
    /// URL of the push-event gateway, e.g. `ws://localhost:4000/gateway`.
    pub gateway_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url =
            std::env::var("AGORA_API_URL").unwrap_or_else(|_| "http://localhost:4000".into());
        let gateway_url = std::env::var("AGORA_GATEWAY_URL")
            .unwrap_or_else(|_| "ws://localhost:4000/gateway".into());
        let host = std::env::var("AGORA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("AGORA_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;

        Ok(Self { api_base_url, gateway_url, host, port })
    }
}

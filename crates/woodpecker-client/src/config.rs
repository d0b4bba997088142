use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the Woodpecker API, without trailing slash
    pub api_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Delay before the forced opening move is auto-played
    pub opening_move_delay: Duration,

    /// Period of the session elapsed-time ticker
    pub tick_period: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(30),
            opening_move_delay: Duration::from_millis(500),
            tick_period: Duration::from_secs(1),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("WOODPECKER_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            request_timeout: env::var("WOODPECKER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            opening_move_delay: env::var("WOODPECKER_OPENING_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.opening_move_delay),
            tick_period: env::var("WOODPECKER_TICK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_period),
        }
    }
}

use std::time::Duration;

/// Settings for one playing client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket url of the relay.
    pub server_url: String,
    /// Retries after a failure before settling into `Disconnected`.
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub tick_interval: Duration,
    pub default_minutes: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3000".to_string(),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(5),
            tick_interval: Duration::from_secs(1),
            default_minutes: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

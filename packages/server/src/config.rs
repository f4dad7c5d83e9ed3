//! Relay configuration.

use std::time::Duration;

/// Default namespace for Presence Store keys
pub const DEFAULT_KEY_PREFIX: &str = "tsunagi";

/// Default time an empty room survives before it is deleted
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(5000);

/// Default time a generated room waits for its first participant
pub const DEFAULT_UNCLAIMED_ROOM_TTL: Duration = Duration::from_secs(60);

/// Settings for one relay instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Shared Presence Store; `None` selects the in-memory store (single instance only)
    pub redis_url: Option<String>,
    pub key_prefix: String,
    pub grace_period: Duration,
    /// How long a generated room nobody has joined stays active
    pub unclaimed_room_ttl: Duration,
}

impl RelayConfig {
    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether rooms are shared with other relay instances
    pub fn is_distributed(&self) -> bool {
        self.redis_url.is_some()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            redis_url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            grace_period: DEFAULT_GRACE_PERIOD,
            unclaimed_room_ttl: DEFAULT_UNCLAIMED_ROOM_TTL,
        }
    }
}

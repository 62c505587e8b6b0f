use std::time::Duration;

use serde::Deserialize;

/// Server-side browser session storage
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionsConfig {
    /// Seconds without access before a session is evicted
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
    /// Upper bound on live sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl SessionsConfig {
    /// Idle TTL as Duration
    pub const fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_idle_ttl_secs() -> u64 {
    3600
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_sessions() -> u64 {
    10_000
}

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT, EOL, NO_IDLE_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection configuration
///
/// Missing fields fall back to their defaults when deserialized, so a
/// partial document such as `{"host": "10.0.0.5", "port": 7000}` is valid.
///
/// # Example
///
/// ```
/// use sockline_core::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig::new("127.0.0.1", 7000).idle_timeout_ms(5000);
///
/// assert_eq!(config.address(), "127.0.0.1:7000");
/// assert_eq!(config.idle_timeout(), Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Remote host name or IP address
    pub host: String,

    /// Remote port
    pub port: u16,

    /// Idle timeout in milliseconds (0 disables it)
    pub idle_timeout_ms: u64,

    /// End-of-message delimiter
    pub delimiter: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout_ms: NO_IDLE_TIMEOUT,
            delimiter: EOL.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration for `host:port` with every other field defaulted
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the idle timeout in milliseconds (0 disables it)
    pub fn idle_timeout_ms(mut self, idle_timeout_ms: u64) -> Self {
        self.idle_timeout_ms = idle_timeout_ms;
        self
    }

    /// Set the end-of-message delimiter
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Idle timeout as a duration, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms != NO_IDLE_TIMEOUT).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    /// `host:port` string, for logging
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

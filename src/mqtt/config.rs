use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ConfigError;

pub const DEFAULT_HOST: &str = "mqtt.rubu.be";
pub const DEFAULT_PORT: u16 = 9003;
pub const DEFAULT_WS_PATH: &str = "/mqtt";
pub const COLOR_TOPIC: &str = "strudel/color";
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
pub const MAX_KEEP_ALIVE_SECS: u64 = u16::MAX as u64;

/// Fixed broker connection parameters shared by every session.
///
/// Credentials are deliberately not part of this struct; they are supplied per
/// session and never written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker hostname without scheme (e.g. "mqtt.example.com")
    pub host: String,
    pub port: u16,
    /// TLS on the transport (`wss` / `mqtts`)
    pub secure: bool,
    /// Tunnel MQTT through WebSockets instead of plain TCP
    pub websocket: bool,
    /// WebSocket path, only used when `websocket` is set
    pub path: String,
    /// Topic the color message is published to
    pub topic: String,
    pub keep_alive_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secure: true,
            websocket: true,
            path: DEFAULT_WS_PATH.to_string(),
            topic: COLOR_TOPIC.to_string(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

impl BrokerConfig {
    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.host.chars().any(char::is_whitespace) || self.host.contains("://") {
            return Err(ConfigError::MalformedHost(self.host.clone()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.websocket && !self.path.starts_with('/') {
            return Err(ConfigError::InvalidPath(self.path.clone()));
        }
        if self.topic.is_empty() || self.topic.contains(['+', '#']) {
            return Err(ConfigError::InvalidTopic(self.topic.clone()));
        }
        // CONNECT carries keep-alive as u16 seconds
        if !(1..=MAX_KEEP_ALIVE_SECS).contains(&self.keep_alive_secs) {
            return Err(ConfigError::InvalidKeepAlive);
        }
        Ok(())
    }

    /// Address handed to rumqttc.
    ///
    /// For WebSocket transports rumqttc expects the full URL as "host".
    pub fn broker_address(&self) -> String {
        if self.websocket {
            let scheme = if self.secure { "wss" } else { "ws" };
            format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
        } else {
            self.host.clone()
        }
    }
}

impl fmt::Display for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.websocket {
            write!(f, "{}", self.broker_address())
        } else {
            let scheme = if self.secure { "mqtts" } else { "mqtt" };
            write!(f, "{}://{}:{}", scheme, self.host, self.port)
        }
    }
}

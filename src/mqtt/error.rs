//! Error types for the publish workflow

use thiserror::Error;

/// Terminal failure kinds of a [`ConnectionSession`](super::session::ConnectionSession).
///
/// Every variant is caught inside the session and turned into a
/// [`SessionReport`](super::session::SessionReport); none of them reach the
/// code that triggered the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The broker refused the connection or the transport could not be opened
    #[error("Unable to connect to MQTT broker: {reason}")]
    ConnectFailure { reason: String },

    /// The connection dropped after it had been established
    #[error("Connection to MQTT broker lost: {reason}")]
    ConnectionLost { reason: String },

    /// The message could not be handed to the transport
    #[error("Error publishing to MQTT broker: {cause}")]
    PublishFailure { cause: String },

    /// Client handle or message could not be built
    #[error("Unable to construct MQTT client or message: {cause}")]
    ConstructionFailure { cause: String },
}

impl SessionError {
    pub fn connect_failure(reason: impl Into<String>) -> Self {
        Self::ConnectFailure {
            reason: reason.into(),
        }
    }

    pub fn connection_lost(reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            reason: reason.into(),
        }
    }

    pub fn publish_failure(cause: impl Into<String>) -> Self {
        Self::PublishFailure {
            cause: cause.into(),
        }
    }

    pub fn construction_failure(cause: impl Into<String>) -> Self {
        Self::ConstructionFailure {
            cause: cause.into(),
        }
    }

    /// Short label used in logs and the UI outcome list
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectFailure { .. } => "connect-failed",
            Self::ConnectionLost { .. } => "connection-lost",
            Self::PublishFailure { .. } => "publish-error",
            Self::ConstructionFailure { .. } => "construction-error",
        }
    }
}

/// Errors raised synchronously by a [`BrokerLink`](super::link::BrokerLink)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// A request was made before `connect` set up the client
    #[error("Client is not connected")]
    NotConnected,

    /// `connect` was called twice on the same handle
    #[error("Connect was already requested on this client")]
    AlreadyConnecting,

    /// The request queue of the underlying client rejected the request
    #[error("Client request failed: {0}")]
    Client(String),

    /// Invalid settings detected while preparing the connect request
    #[error("Invalid connect options: {0}")]
    Options(String),
}

/// Problems detected while validating broker settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Broker host must not be empty")]
    EmptyHost,

    #[error("Broker host '{0}' must not contain whitespace or a scheme prefix")]
    MalformedHost(String),

    #[error("Broker port must be between 1 and 65535")]
    InvalidPort,

    #[error("WebSocket path '{0}' must start with '/'")]
    InvalidPath(String),

    #[error("Topic '{0}' is not a valid publish topic")]
    InvalidTopic(String),

    #[error("Keep-alive must be between 1 and 65535 seconds")]
    InvalidKeepAlive,
}

use rumqttc::QoS;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::error::SessionError;

/// Swatch value used as the "surprise me" option in the picker
pub const RANDOM_SWATCH: &str = "gray";
/// Value sent in place of [`RANDOM_SWATCH`]
pub const RANDOM_COLOR: &str = "random";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Color selection must not be empty")]
    Empty,
}

/// Requested color, captured once from the triggering UI event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ColorSelection(String);

impl ColorSelection {
    /// Wraps a canonical color value without any substitution.
    pub fn new(value: impl Into<String>) -> Result<Self, ColorError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ColorError::Empty);
        }
        Ok(Self(value))
    }

    /// Maps a raw swatch value to the selection that goes on the wire.
    ///
    /// Only the exact gray placeholder is substituted; any other value is
    /// kept byte for byte.
    pub fn from_swatch(raw: &str) -> Result<Self, ColorError> {
        if raw == RANDOM_SWATCH {
            Self::new(RANDOM_COLOR)
        } else {
            Self::new(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_random(&self) -> bool {
        self.0 == RANDOM_COLOR
    }
}

impl fmt::Display for ColorSelection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Username/password pair read at trigger time.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    /// Password is never printed.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Serialize)]
struct ColorPayload<'a> {
    color: &'a ColorSelection,
}

/// One outgoing color message: fire and forget, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    topic: String,
    payload: Vec<u8>,
    qos: QoS,
    retain: bool,
}

impl PublishedMessage {
    pub fn color(topic: &str, color: &ColorSelection) -> Result<Self, SessionError> {
        let payload = serde_json::to_vec(&ColorPayload { color })
            .map_err(|e| SessionError::construction_failure(e.to_string()))?;

        Ok(Self {
            topic: topic.to_string(),
            payload,
            qos: QoS::AtMostOnce,
            retain: false,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    pub fn retain(&self) -> bool {
        self.retain
    }

    /// Payload as text, for logging.
    pub fn render(&self) -> String {
        format!(
            "{}: {}",
            self.topic,
            String::from_utf8_lossy(&self.payload)
        )
    }
}

//! # MQTT Publish Module
//!
//! Sends the chosen color to the broker over a short-lived MQTT connection.
//! Every user action gets its own client: connect, publish one message,
//! disconnect, drop the client.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── config.rs   - Broker endpoint, topic and transport settings
//! ├── error.rs    - Session, link and config error types
//! ├── factory.rs  - Client identities and the per-session client factory
//! ├── link.rs     - BrokerLink transport seam and its rumqttc implementation
//! ├── message.rs  - Color selection, credentials and the outgoing message
//! ├── session.rs  - Session state machine and the SessionLauncher entry point
//! └── status.rs   - Report sink and outcome bookkeeping for the UI
//! ```
//!
//! ## Flow
//!
//! ```text
//! UI click ──► SessionLauncher::begin(color, credentials)
//!                 │
//!                 ├─► BrokerClientFactory::create()  (fresh "strudel<n>" client)
//!                 ├─► connect request                (returns immediately)
//!                 └─► spawned task:
//!                        ConnAck ──► publish {"color": ..} ──► disconnect ──► report
//!                        refused / lost ─────────────────────────────────────► report
//! ```
//!
//! Sessions never share a client and never retry. A failed attempt is
//! reported and the user simply clicks again.

pub mod config;
pub mod error;
pub mod factory;
pub mod link;
pub mod message;
pub mod session;
pub mod status;

pub use config::BrokerConfig;
pub use error::{ConfigError, LinkError, SessionError};
pub use factory::{BrokerClientFactory, ClientFactory, ClientIdentity};
pub use message::{ColorSelection, Credentials, PublishedMessage};
pub use session::{SessionLauncher, SessionOutcome, SessionReport};
pub use status::{ReportSink, SessionStatus};

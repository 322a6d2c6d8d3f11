//! Ephemeral publish session with statum state machine
//!
//! One user action creates one session. The session owns a fresh client handle
//! and walks it through a single connect → publish → disconnect cycle, then
//! drops it.
//!
//! # State Machine
//!
//! ```text
//! Idle ──► Connecting ──► Connected ──► Disconnecting ──► Terminated
//!   │           │                             │               ▲
//!   │           └── connect failed / lost ────┼───────────────┤
//!   └── connect request rejected ─────────────┴── lost ───────┘
//! ```
//!
//! Each transition consumes the session, so a completion event can only be
//! handled once and nothing is handled after `Terminated`. Publishing is
//! folded into the `Connected → Disconnecting` transition: the message is
//! handed to the transport and the disconnect is requested right after,
//! whether the hand-off worked or not.
//!
//! There is no timeout on `Connecting`. A broker that never answers leaves the
//! session task parked with one idle handle.

use chrono::{DateTime, Local};
use statum::{machine, state};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::BrokerConfig;
use super::error::SessionError;
use super::factory::{ClientFactory, ClientIdentity};
use super::link::{BrokerLink, ConnectRequest, LinkEvent};
use super::message::{ColorSelection, Credentials, PublishedMessage};
use super::status::ReportSink;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Message handed to the transport and the connection closed
    Published,
    Failed(SessionError),
}

impl SessionOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// The single report every session produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// `None` if the factory failed before an identity existed
    pub identity: Option<ClientIdentity>,
    pub color: ColorSelection,
    pub outcome: SessionOutcome,
    pub finished_at: DateTime<Local>,
}

impl SessionReport {
    pub fn new(
        identity: Option<ClientIdentity>,
        color: ColorSelection,
        outcome: SessionOutcome,
    ) -> Self {
        Self {
            identity,
            color,
            outcome,
            finished_at: Local::now(),
        }
    }

    /// One-line summary for log views
    pub fn render(&self) -> String {
        let who = self
            .identity
            .as_ref()
            .map(ClientIdentity::to_string)
            .unwrap_or_else(|| "-".to_string());
        match &self.outcome {
            SessionOutcome::Published => format!(
                "{} [{}] published '{}'",
                self.finished_at.format("%H:%M:%S"),
                who,
                self.color
            ),
            SessionOutcome::Failed(e) => format!(
                "{} [{}] {} '{}': {}",
                self.finished_at.format("%H:%M:%S"),
                who,
                e.kind(),
                self.color,
                e
            ),
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,          // Handle created, nothing on the wire
    Connecting,    // Connect request issued
    Connected,     // Broker accepted, publish pending
    Disconnecting, // Publish attempted, waiting for the disconnect to go out
    Terminated,    // Done; outcome fixed
}

#[machine]
pub struct ConnectionSession<S: SessionState> {
    identity: ClientIdentity,
    color: ColorSelection,
    // Moved into the connect request, never kept afterwards
    credentials: Option<Credentials>,
    topic: String,
    secure: bool,
    link: Box<dyn BrokerLink>,
    error: Option<SessionError>,
    disconnect_queued: bool,
}

impl<S: SessionState> ConnectionSession<S> {
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn color(&self) -> &ColorSelection {
        &self.color
    }
}

impl ConnectionSession<Idle> {
    pub fn create(
        link: Box<dyn BrokerLink>,
        color: ColorSelection,
        credentials: Credentials,
        topic: String,
        secure: bool,
    ) -> Self {
        let identity = link.identity().clone();
        debug!("New session {} for color '{}'", identity, color);

        Self::new(
            identity,
            color,
            Some(credentials),
            topic,
            secure,
            link,
            None,  // error
            false, // disconnect_queued
        )
    }

    /// Issues the one connect request of this session.
    ///
    /// A request the link refuses to even queue ends the session without any
    /// network traffic.
    pub fn connect(
        mut self,
    ) -> Result<ConnectionSession<Connecting>, ConnectionSession<Terminated>> {
        let request = ConnectRequest {
            secure: self.secure,
            credentials: self.credentials.take().unwrap_or_default(),
        };

        match self.link.connect(request) {
            Ok(()) => {
                info!("Connecting {} to MQTT broker", self.identity);
                Ok(self.transition())
            }
            Err(e) => {
                error!("Unable to issue connect for {}: {}", self.identity, e);
                self.error = Some(SessionError::construction_failure(e.to_string()));
                Err(self.transition())
            }
        }
    }
}

impl ConnectionSession<Connecting> {
    /// Waits for the connect outcome. Exactly one of success, failure or
    /// lost connection ends this state.
    pub async fn await_connection(
        mut self,
    ) -> Result<ConnectionSession<Connected>, ConnectionSession<Terminated>> {
        loop {
            let event = self.link.next_event().await;
            match event {
                LinkEvent::ConnectSucceeded => {
                    info!("Connected to MQTT broker as {}", self.identity);
                    return Ok(self.transition());
                }
                LinkEvent::ConnectFailed(reason) => {
                    warn!("Unable to connect {} to MQTT broker: {}", self.identity, reason);
                    self.error = Some(SessionError::connect_failure(reason));
                    return Err(self.transition());
                }
                LinkEvent::ConnectionLost(reason) => {
                    warn!("{} disconnected before connect finished: {}", self.identity, reason);
                    self.error = Some(SessionError::connection_lost(reason));
                    return Err(self.transition());
                }
                LinkEvent::Flushed => {
                    debug!("Ignoring flush for {} while connecting", self.identity);
                }
            }
        }
    }
}

impl ConnectionSession<Connected> {
    /// Hands the color message to the transport, then requests the
    /// disconnect unconditionally.
    pub fn publish_and_disconnect(mut self) -> ConnectionSession<Disconnecting> {
        match PublishedMessage::color(&self.topic, &self.color) {
            Ok(message) => match self.link.send(&message) {
                Ok(()) => info!("Message published to MQTT broker: {}", message.render()),
                Err(e) => {
                    error!("Error publishing to MQTT broker from {}: {}", self.identity, e);
                    self.error = Some(SessionError::publish_failure(e.to_string()));
                }
            },
            Err(e) => {
                error!("Unable to build message for {}: {}", self.identity, e);
                self.error = Some(e);
            }
        }

        match self.link.disconnect() {
            Ok(()) => self.disconnect_queued = true,
            Err(e) => warn!("Disconnect request for {} failed: {}", self.identity, e),
        }

        self.transition()
    }
}

impl ConnectionSession<Disconnecting> {
    /// Waits until the disconnect left the client, or the connection dropped.
    pub async fn finish(mut self) -> ConnectionSession<Terminated> {
        while self.disconnect_queued {
            let event = self.link.next_event().await;
            match event {
                LinkEvent::Flushed => {
                    info!("{} disconnected from MQTT broker", self.identity);
                    self.disconnect_queued = false;
                }
                LinkEvent::ConnectionLost(reason) => {
                    warn!("{} lost connection while disconnecting: {}", self.identity, reason);
                    if self.error.is_none() {
                        self.error = Some(SessionError::connection_lost(reason));
                    }
                    self.disconnect_queued = false;
                }
                other => debug!("Ignoring {:?} for {} while disconnecting", other, self.identity),
            }
        }

        self.transition()
    }
}

impl ConnectionSession<Terminated> {
    pub fn outcome(&self) -> SessionOutcome {
        match &self.error {
            Some(e) => SessionOutcome::Failed(e.clone()),
            None => SessionOutcome::Published,
        }
    }

    /// Consumes the session; the client handle is dropped here.
    pub fn into_report(self) -> SessionReport {
        let outcome = self.outcome();
        SessionReport::new(Some(self.identity), self.color, outcome)
    }
}

/// Runs a session from `Connecting` to `Terminated`.
pub async fn drive(session: ConnectionSession<Connecting>) -> ConnectionSession<Terminated> {
    match session.await_connection().await {
        Ok(connected) => connected.publish_and_disconnect().finish().await,
        Err(terminated) => terminated,
    }
}

/// Entry point for UI triggers: one `begin` call, one session.
#[derive(Clone)]
pub struct SessionLauncher {
    factory: Arc<dyn ClientFactory>,
    topic: String,
    secure: bool,
    sink: ReportSink,
}

impl SessionLauncher {
    pub fn new(factory: Arc<dyn ClientFactory>, config: &BrokerConfig, sink: ReportSink) -> Self {
        Self {
            factory,
            topic: config.topic.clone(),
            secure: config.secure,
            sink,
        }
    }

    /// Starts one publish attempt.
    ///
    /// Creates the client and issues the connect request before returning;
    /// the rest runs in a spawned task. Must be called from within a tokio
    /// runtime. The returned handle resolves to the session's report, which
    /// has already been passed to the sink. Dropping the handle does not stop
    /// the session.
    pub fn begin(&self, color: ColorSelection, credentials: Credentials) -> JoinHandle<SessionReport> {
        info!("Requested color: {}", color);
        let sink = self.sink.clone();

        let link = match self.factory.create() {
            Ok(link) => link,
            Err(e) => {
                let report = SessionReport::new(None, color, SessionOutcome::Failed(e));
                sink.report(&report);
                return tokio::spawn(async move { report });
            }
        };

        let session =
            ConnectionSession::create(link, color, credentials, self.topic.clone(), self.secure);

        match session.connect() {
            Ok(connecting) => tokio::spawn(async move {
                let report = drive(connecting).await.into_report();
                sink.report(&report);
                report
            }),
            Err(terminated) => {
                let report = terminated.into_report();
                sink.report(&report);
                tokio::spawn(async move { report })
            }
        }
    }
}

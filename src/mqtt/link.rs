//! Transport seam between a session and the MQTT client library
//!
//! A [`BrokerLink`] is the client handle a session drives. It only ever moves
//! forward: `connect` once, wait for the connect outcome, `send` at most once,
//! `disconnect`, wait for the disconnect to be flushed. The production
//! implementation wraps a rumqttc [`AsyncClient`] and its [`EventLoop`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, Transport,
};
use tracing::{debug, trace};

use super::config::BrokerConfig;
use super::error::LinkError;
use super::factory::ClientIdentity;
use super::message::{Credentials, PublishedMessage};

/// Capacity of the rumqttc request queue; a session queues two requests at most
const REQUEST_CAPACITY: usize = 10;

pub type LinkFuture<'a> = Pin<Box<dyn Future<Output = LinkEvent> + Send + 'a>>;

/// Parameters of the single connect request a session issues
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub secure: bool,
    pub credentials: Credentials,
}

/// Asynchronous outcomes reported by a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Broker accepted the connection
    ConnectSucceeded,
    /// Connect attempt ended without a connection
    ConnectFailed(String),
    /// An established connection dropped without being asked to
    ConnectionLost(String),
    /// The requested disconnect went out on the wire
    Flushed,
}

/// Client handle owned by exactly one session.
pub trait BrokerLink: Send {
    fn identity(&self) -> &ClientIdentity;

    /// Issues the connect request. Returns once the request is queued; the
    /// outcome arrives through [`BrokerLink::next_event`].
    fn connect(&mut self, request: ConnectRequest) -> Result<(), LinkError>;

    /// Resolves with the next outcome. May never resolve if the broker never
    /// answers.
    fn next_event(&mut self) -> LinkFuture<'_>;

    fn send(&mut self, message: &PublishedMessage) -> Result<(), LinkError>;

    fn disconnect(&mut self) -> Result<(), LinkError>;
}

/// [`BrokerLink`] backed by rumqttc.
///
/// No I/O happens until the session polls [`BrokerLink::next_event`] after
/// `connect`.
pub struct RumqttLink {
    identity: ClientIdentity,
    config: BrokerConfig,
    client: Option<AsyncClient>,
    eventloop: Option<EventLoop>,
    connected: bool,
}

impl RumqttLink {
    pub fn new(identity: ClientIdentity, config: BrokerConfig) -> Self {
        Self {
            identity,
            config,
            client: None,
            eventloop: None,
            connected: false,
        }
    }

    fn mqtt_options(&self, request: &ConnectRequest) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.identity.as_str(),
            self.config.broker_address(),
            self.config.port,
        );
        options
            .set_credentials(
                request.credentials.username.clone(),
                request.credentials.password.clone(),
            )
            .set_keep_alive(Duration::from_secs(self.config.keep_alive_secs))
            .set_clean_session(true);

        let transport = match (self.config.websocket, request.secure) {
            (true, true) => Transport::wss_with_default_config(),
            (true, false) => Transport::Ws,
            (false, true) => Transport::tls_with_default_config(),
            (false, false) => Transport::Tcp,
        };
        options.set_transport(transport);
        options
    }
}

impl BrokerLink for RumqttLink {
    fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    fn connect(&mut self, request: ConnectRequest) -> Result<(), LinkError> {
        if self.client.is_some() {
            return Err(LinkError::AlreadyConnecting);
        }
        self.config
            .validate()
            .map_err(|e| LinkError::Options(e.to_string()))?;

        let options = self.mqtt_options(&request);
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        debug!(
            "Connect requested for {} at {} (secure: {})",
            self.identity, self.config, request.secure
        );

        self.client = Some(client);
        self.eventloop = Some(eventloop);
        Ok(())
    }

    fn next_event(&mut self) -> LinkFuture<'_> {
        Box::pin(async move {
            let Some(eventloop) = self.eventloop.as_mut() else {
                return LinkEvent::ConnectFailed("connect was never requested".to_string());
            };

            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            self.connected = true;
                            return LinkEvent::ConnectSucceeded;
                        }
                        return LinkEvent::ConnectFailed(describe_return_code(ack.code));
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => return LinkEvent::Flushed,
                    Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                        debug!("Publish {} written for {}", pkid, self.identity);
                    }
                    Ok(event) => trace!("{} event: {:?}", self.identity, event),
                    Err(ConnectionError::ConnectionRefused(code)) => {
                        return LinkEvent::ConnectFailed(describe_return_code(code));
                    }
                    Err(e) if !self.connected => return LinkEvent::ConnectFailed(e.to_string()),
                    Err(e) => return LinkEvent::ConnectionLost(e.to_string()),
                }
            }
        })
    }

    fn send(&mut self, message: &PublishedMessage) -> Result<(), LinkError> {
        let client = self.client.as_ref().ok_or(LinkError::NotConnected)?;
        client
            .try_publish(
                message.topic(),
                message.qos(),
                message.retain(),
                message.payload().to_vec(),
            )
            .map_err(|e| LinkError::Client(e.to_string()))
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        let client = self.client.as_ref().ok_or(LinkError::NotConnected)?;
        client
            .try_disconnect()
            .map_err(|e| LinkError::Client(e.to_string()))
    }
}

/// Human readable CONNACK refusal, worded like the broker-side reason codes
pub fn describe_return_code(code: ConnectReturnCode) -> String {
    match code {
        ConnectReturnCode::Success => "Success",
        ConnectReturnCode::RefusedProtocolVersion => "Unacceptable protocol version",
        ConnectReturnCode::BadClientId => "Identifier rejected",
        ConnectReturnCode::ServiceUnavailable => "Server unavailable",
        ConnectReturnCode::BadUserNamePassword => "Bad user name or password",
        ConnectReturnCode::NotAuthorized => "Not authorized",
    }
    .to_string()
}

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::blocks::MessageTemplate;
use crate::client::SLACK_API_BASE;
use crate::events::{EventContext, EventDispatcher, HandlerResult, SlackEnvelope};
use crate::platform::ChatPlatform;
use crate::wire::{ack_frame, parse_frame, SocketFrame};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Open a new connection when the server closes one cleanly.
    pub reconnect_on_close: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000, reconnect_on_close: true }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    /// `Ok(None)` once the current connection is closed.
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
    responder: Option<Arc<dyn ChatPlatform>>,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy, responder: None }
    }

    /// Delivers handler replies privately to the user who triggered them.
    pub fn with_responder(mut self, responder: Arc<dyn ChatPlatform>) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Runs until the server closes cleanly with reconnects disabled, or
    /// until `max_retries` consecutive failures. A successful connect resets
    /// the failure count.
    pub async fn start(&self) -> Result<()> {
        let mut attempt = 0;

        loop {
            match self.connect_and_pump(&mut attempt).await {
                Ok(()) if self.reconnect_policy.reconnect_on_close => {
                    info!(attempt, "socket mode connection closed; reconnecting");
                    attempt = 0;
                }
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        anyhow::bail!(
                            "socket mode retries exhausted after {} consecutive failures: {transport_error}",
                            attempt + 1
                        );
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn connect_and_pump(&self, attempt: &mut u32) -> Result<(), TransportError> {
        info!(attempt = *attempt, "opening socket mode transport connection");
        self.transport.connect().await?;
        info!(attempt = *attempt, "socket mode transport connected");
        *attempt = 0;

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!("socket mode transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };
            let channel_id = envelope.event.reply_target().map(|(channel, _)| channel.to_owned());

            info!(
                event_name = "ingress.slack.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                channel_id = channel_id.as_deref().unwrap_or("unknown"),
                "received slack envelope"
            );

            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge slack envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    "acknowledged slack envelope"
                );
            }

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };
            match self.dispatcher.dispatch(&envelope, &context).await {
                Ok(HandlerResult::Responded(message)) => {
                    self.respond(&envelope, &message).await;
                }
                Ok(HandlerResult::Processed | HandlerResult::Ignored) => {}
                Err(error) => {
                    warn!(
                        envelope_id = %envelope.envelope_id,
                        correlation_id = %envelope.envelope_id,
                        channel_id = channel_id.as_deref().unwrap_or("unknown"),
                        error = %error,
                        "event dispatch failed; continuing socket loop"
                    );
                }
            }
        }
    }

    async fn respond(&self, envelope: &SlackEnvelope, message: &MessageTemplate) {
        let (Some(responder), Some((channel_id, user_id))) =
            (self.responder.as_ref(), envelope.event.reply_target())
        else {
            return;
        };

        if let Err(error) = responder.send_ephemeral(channel_id, user_id, message).await {
            warn!(
                event_name = "egress.slack.reply_failed",
                correlation_id = %envelope.envelope_id,
                channel_id,
                error = %error,
                "failed to deliver private reply"
            );
        }
    }
}

type SlackStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live Socket Mode connection authenticated with the app-level token.
pub struct SlackSocketTransport {
    client: Client,
    app_token: SecretString,
    api_base: String,
    stream: Mutex<Option<SlackStream>>,
}

impl SlackSocketTransport {
    pub fn new(app_token: SecretString) -> Self {
        Self {
            client: Client::new(),
            app_token,
            api_base: SLACK_API_BASE.to_owned(),
            stream: Mutex::new(None),
        }
    }

    async fn open_connection_url(&self) -> Result<String, TransportError> {
        let response = self
            .client
            .post(format!("{}/apps.connections.open", self.api_base))
            .bearer_auth(self.app_token.expose_secret())
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let body: Value =
            response.json().await.map_err(|error| TransportError::Connect(error.to_string()))?;

        connection_url(&body)
    }
}

fn connection_url(body: &Value) -> Result<String, TransportError> {
    if body["ok"].as_bool() != Some(true) {
        let error = body["error"].as_str().unwrap_or("unknown");
        return Err(TransportError::Connect(format!("apps.connections.open: {error}")));
    }

    body["url"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| TransportError::Connect("apps.connections.open: missing url".to_owned()))
}

#[async_trait]
impl SocketTransport for SlackSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let url = self.open_connection_url().await?;
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        let mut guard = self.stream.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Err(TransportError::Receive("not connected".to_owned()));
        };

        while let Some(message) = stream.next().await {
            let text = match message.map_err(|error| TransportError::Receive(error.to_string()))? {
                Message::Text(text) => text,
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            match parse_frame(&text) {
                Ok(SocketFrame::Envelope(envelope)) => return Ok(Some(envelope)),
                Ok(SocketFrame::Hello) => debug!("socket mode hello received"),
                Ok(SocketFrame::Disconnect { reason }) => {
                    info!(
                        reason = reason.as_deref().unwrap_or("unspecified"),
                        "socket mode disconnect requested by slack"
                    );
                    return Ok(None);
                }
                Ok(SocketFrame::Other { frame_type }) => {
                    debug!(frame_type = %frame_type, "ignoring socket mode frame");
                }
                Err(error) => warn!(error = %error, "dropping undecodable socket mode frame"),
            }
        }

        Ok(None)
    }

    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Err(TransportError::Acknowledge("not connected".to_owned()));
        };

        stream
            .send(Message::Text(ack_frame(envelope_id)))
            .await
            .map_err(|error| TransportError::Acknowledge(error.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return Ok(());
        };

        match stream.close(None).await {
            Ok(()) => Ok(()),
            // The peer usually closed first.
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
            | Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(error) => Err(TransportError::Disconnect(error.to_string())),
        }
    }
}

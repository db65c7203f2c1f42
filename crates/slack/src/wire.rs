//! Socket Mode frame decoding.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::events::{BlockActionEvent, SlackEnvelope, SlackEvent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketFrame {
    Hello,
    /// Slack is about to close the connection (refresh, maintenance).
    Disconnect { reason: Option<String> },
    Envelope(SlackEnvelope),
    /// Control frames we do not act on.
    Other { frame_type: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed socket mode frame: {0}")]
pub struct WireError(String);

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    frame_type: String,
    envelope_id: Option<String>,
    reason: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct InteractivePayload {
    #[serde(rename = "type")]
    payload_type: String,
    user: Option<IdRef>,
    channel: Option<IdRef>,
    container: Option<Container>,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Container {
    message_ts: Option<String>,
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action_id: String,
    value: Option<String>,
    action_ts: Option<String>,
}

pub fn parse_frame(text: &str) -> Result<SocketFrame, WireError> {
    let raw: RawFrame =
        serde_json::from_str(text).map_err(|error| WireError(error.to_string()))?;

    match (raw.frame_type.as_str(), raw.envelope_id) {
        ("hello", _) => Ok(SocketFrame::Hello),
        ("disconnect", _) => Ok(SocketFrame::Disconnect { reason: raw.reason }),
        (frame_type, Some(envelope_id)) => {
            let event = match frame_type {
                "interactive" => interactive_event(raw.payload)?,
                other => SlackEvent::Unsupported { event_type: other.to_owned() },
            };
            Ok(SocketFrame::Envelope(SlackEnvelope { envelope_id, event }))
        }
        (frame_type, None) => Ok(SocketFrame::Other { frame_type: frame_type.to_owned() }),
    }
}

/// The acknowledgement Slack expects for `envelope_id`.
pub fn ack_frame(envelope_id: &str) -> String {
    serde_json::json!({ "envelope_id": envelope_id }).to_string()
}

fn interactive_event(payload: Value) -> Result<SlackEvent, WireError> {
    let payload: InteractivePayload =
        serde_json::from_value(payload).map_err(|error| WireError(error.to_string()))?;

    if payload.payload_type != "block_actions" {
        return Ok(SlackEvent::Unsupported { event_type: payload.payload_type });
    }

    let channel_id = payload
        .channel
        .map(|channel| channel.id)
        .or_else(|| payload.container.as_ref().and_then(|container| container.channel_id.clone()));
    let (Some(channel_id), Some(user), Some(action)) =
        (channel_id, payload.user, payload.actions.into_iter().next())
    else {
        return Ok(SlackEvent::Unsupported { event_type: "block_actions".to_owned() });
    };

    Ok(SlackEvent::BlockAction(BlockActionEvent {
        channel_id,
        message_ts: payload.container.and_then(|container| container.message_ts),
        user_id: user.id,
        action_id: action.action_id,
        value: action.value,
        action_ts: action.action_ts,
    }))
}

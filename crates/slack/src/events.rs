use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::blocks::MessageTemplate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    BlockAction(BlockActionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::BlockAction(_) => SlackEventType::BlockAction,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }

    /// Channel and user a private reply to this event should go to.
    pub fn reply_target(&self) -> Option<(&str, &str)> {
        match self {
            Self::BlockAction(event) => Some((event.channel_id.as_str(), event.user_id.as_str())),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    BlockAction,
    Unsupported,
}

/// A button press on one of the bot's messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub channel_id: String,
    pub message_ts: Option<String>,
    pub user_id: String,
    pub action_id: String,
    pub value: Option<String>,
    /// Slack's `secs.micros` timestamp of the press.
    pub action_ts: Option<String>,
}

impl BlockActionEvent {
    /// When the press happened, if Slack told us.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.action_ts.as_deref().and_then(parse_slack_ts)
    }
}

/// Parses Slack's `1730000000.123456` timestamps.
pub fn parse_slack_ts(raw: &str) -> Option<DateTime<Utc>> {
    let (secs, fraction) = match raw.trim().split_once('.') {
        Some((secs, fraction)) => (secs, fraction),
        None => (raw.trim(), ""),
    };
    let secs: i64 = secs.parse().ok()?;

    let digits: String = fraction.chars().take(9).collect();
    if !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let nanos = if digits.is_empty() {
        0
    } else {
        let scale = 10_u32.pow(9 - digits.len() as u32);
        digits.parse::<u32>().ok()?.checked_mul(scale)?
    };

    DateTime::from_timestamp(secs, nanos)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(MessageTemplate),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("block action handler failure: {0}")]
    BlockAction(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[async_trait]
pub trait BlockActionService: Send + Sync {
    /// `Ok(None)` means the action was not one this service owns.
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError>;
}

pub struct BlockActionHandler<S> {
    service: S,
}

impl<S> BlockActionHandler<S>
where
    S: BlockActionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for BlockActionHandler<S>
where
    S: BlockActionService + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::BlockAction
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockAction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let message = self.service.handle_block_action(event, ctx).await?;
        Ok(match message {
            Some(message) => HandlerResult::Responded(message),
            None => HandlerResult::Processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Timelike, Utc};

    use super::{
        parse_slack_ts, BlockActionEvent, BlockActionHandler, BlockActionService, EventContext,
        EventDispatcher, EventHandlerError, HandlerResult, SlackEnvelope, SlackEvent,
    };
    use crate::blocks::{notice_message, MessageTemplate};

    struct EchoService;

    #[async_trait]
    impl BlockActionService for EchoService {
        async fn handle_block_action(
            &self,
            event: &BlockActionEvent,
            ctx: &EventContext,
        ) -> Result<Option<MessageTemplate>, EventHandlerError> {
            match event.action_id.as_str() {
                "echo" => Ok(Some(notice_message(&ctx.correlation_id))),
                "fail" => Err(EventHandlerError::BlockAction("boom".to_owned())),
                _ => Ok(None),
            }
        }
    }

    fn block_action(action_id: &str) -> SlackEnvelope {
        SlackEnvelope {
            envelope_id: "env-1".to_owned(),
            event: SlackEvent::BlockAction(BlockActionEvent {
                channel_id: "C1".to_owned(),
                message_ts: Some("1730000000.000100".to_owned()),
                user_id: "U1".to_owned(),
                action_id: action_id.to_owned(),
                value: None,
                action_ts: Some("1730000001.250000".to_owned()),
            }),
        }
    }

    fn dispatcher() -> EventDispatcher {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(BlockActionHandler::new(EchoService));
        dispatcher
    }

    #[tokio::test]
    async fn dispatcher_routes_block_actions_to_service() {
        let ctx = EventContext { correlation_id: "corr-7".to_owned() };

        let result = dispatcher().dispatch(&block_action("echo"), &ctx).await.expect("dispatch");

        let HandlerResult::Responded(message) = result else {
            panic!("expected a response, got {result:?}");
        };
        assert_eq!(message.fallback_text, "corr-7");
    }

    #[tokio::test]
    async fn unowned_action_is_processed_without_reply() {
        let result = dispatcher()
            .dispatch(&block_action("someone.else"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let envelope = SlackEnvelope {
            envelope_id: "env-2".to_owned(),
            event: SlackEvent::Unsupported { event_type: "events_api".to_owned() },
        };

        let result = dispatcher().dispatch(&envelope, &EventContext::default()).await;

        assert_eq!(result, Ok(HandlerResult::Ignored));
        assert_eq!(EventDispatcher::new().handler_count(), 0);
    }

    #[tokio::test]
    async fn handler_errors_surface_as_dispatch_errors() {
        let result = dispatcher().dispatch(&block_action("fail"), &EventContext::default()).await;

        assert!(result.is_err());
    }

    #[test]
    fn reply_target_points_at_pressing_user() {
        let envelope = block_action("echo");
        assert_eq!(envelope.event.reply_target(), Some(("C1", "U1")));

        let unsupported = SlackEvent::Unsupported { event_type: "x".to_owned() };
        assert_eq!(unsupported.reply_target(), None);
    }

    #[test]
    fn slack_timestamps_parse_with_micro_precision() {
        let parsed = parse_slack_ts("1730000001.250000").expect("timestamp");

        assert_eq!(parsed.timestamp(), 1_730_000_001);
        assert_eq!(parsed.nanosecond(), 250_000_000);
        assert_eq!(
            parse_slack_ts("1730000001"),
            Some(Utc.timestamp_opt(1_730_000_001, 0).unwrap())
        );
    }

    #[test]
    fn malformed_slack_timestamps_are_rejected() {
        assert_eq!(parse_slack_ts(""), None);
        assert_eq!(parse_slack_ts("yesterday"), None);
        assert_eq!(parse_slack_ts("17.3e5"), None);
    }

    #[test]
    fn occurred_at_reads_action_ts() {
        let SlackEvent::BlockAction(mut event) = block_action("echo").event else {
            unreachable!()
        };
        assert!(event.occurred_at().is_some());

        event.action_ts = None;
        assert_eq!(event.occurred_at(), None);
    }
}

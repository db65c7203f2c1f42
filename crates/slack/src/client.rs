//! Slack Web API client backing [`ChatPlatform`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::blocks::MessageTemplate;
use crate::platform::{ChatPlatform, PlatformError, RecentMessage};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: Option<String>,
    pub bot_id: Option<String>,
}

impl BotIdentity {
    fn authored(&self, message: &HistoryMessage) -> bool {
        let by_bot = self.bot_id.is_some() && message.bot_id == self.bot_id;
        let by_user = self.user_id.is_some() && message.user == self.user_id;
        by_bot || by_user
    }
}

#[derive(Debug, Deserialize)]
struct HistoryMessage {
    ts: String,
    user: Option<String>,
    bot_id: Option<String>,
}

pub struct SlackWebClient {
    client: Client,
    bot_token: SecretString,
    api_base: String,
    identity: OnceCell<BotIdentity>,
}

impl SlackWebClient {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            api_base: SLACK_API_BASE.to_owned(),
            identity: OnceCell::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    /// Identity the bot token belongs to, fetched once via `auth.test`.
    pub async fn identity(&self) -> Result<&BotIdentity, PlatformError> {
        self.identity
            .get_or_try_init(|| async {
                let body = self.post("auth.test", json!({})).await?;
                let identity = BotIdentity {
                    user_id: body["user_id"].as_str().map(str::to_owned),
                    bot_id: body["bot_id"].as_str().map(str::to_owned),
                };
                debug!(
                    event_name = "egress.slack.identity_resolved",
                    user_id = identity.user_id.as_deref().unwrap_or("unknown"),
                    bot_id = identity.bot_id.as_deref().unwrap_or("unknown"),
                    "resolved bot identity"
                );
                Ok(identity)
            })
            .await
    }

    async fn post(&self, method: &str, payload: Value) -> Result<Value, PlatformError> {
        trace!(method, "calling slack web api");
        let response = self
            .client
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&payload)
            .send()
            .await
            .map_err(|error| PlatformError::Request(format!("{method}: {error}")))?;

        read_response(method, response.status(), response.text().await)
    }

    async fn get(&self, method: &str, query: &[(&str, String)]) -> Result<Value, PlatformError> {
        trace!(method, "calling slack web api");
        let response = self
            .client
            .get(format!("{}/{method}", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|error| PlatformError::Request(format!("{method}: {error}")))?;

        read_response(method, response.status(), response.text().await)
    }
}

fn read_response(
    method: &str,
    status: StatusCode,
    body: Result<String, reqwest::Error>,
) -> Result<Value, PlatformError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(PlatformError::Request(format!("{method}: rate limited")));
    }

    let body = body.map_err(|error| PlatformError::Request(format!("{method}: {error}")))?;
    parse_envelope(method, &body)
}

/// Decodes a Web API body and turns `"ok": false` into an error.
fn parse_envelope(method: &str, body: &str) -> Result<Value, PlatformError> {
    let value: Value = serde_json::from_str(body).map_err(|error| PlatformError::Decode {
        method: method.to_owned(),
        detail: error.to_string(),
    })?;

    if value["ok"].as_bool() == Some(true) {
        return Ok(value);
    }

    Err(PlatformError::Api {
        method: method.to_owned(),
        error: value["error"].as_str().unwrap_or("unknown").to_owned(),
    })
}

/// Errors that mean the bot cannot use the channel at all.
fn channel_scoped(error: PlatformError, channel_id: &str) -> PlatformError {
    match &error {
        PlatformError::Api { error: code, .. }
            if matches!(code.as_str(), "channel_not_found" | "not_in_channel" | "is_archived") =>
        {
            PlatformError::ChannelNotFound(channel_id.to_owned())
        }
        _ => error,
    }
}

fn recent_messages(body: &Value, identity: &BotIdentity) -> Result<Vec<RecentMessage>, PlatformError> {
    let messages: Vec<HistoryMessage> =
        serde_json::from_value(body["messages"].clone()).map_err(|error| {
            PlatformError::Decode {
                method: "conversations.history".to_owned(),
                detail: error.to_string(),
            }
        })?;

    Ok(messages
        .into_iter()
        .map(|message| RecentMessage {
            authored_by_self: identity.authored(&message),
            message_id: message.ts,
        })
        .collect())
}

fn message_payload(channel_id: &str, message: &MessageTemplate) -> Value {
    json!({
        "channel": channel_id,
        "text": message.fallback_text,
        "blocks": message.blocks,
    })
}

#[async_trait]
impl ChatPlatform for SlackWebClient {
    async fn send_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<String, PlatformError> {
        let body = self
            .post("chat.postMessage", message_payload(channel_id, message))
            .await
            .map_err(|error| channel_scoped(error, channel_id))?;

        body["ts"].as_str().map(str::to_owned).ok_or_else(|| PlatformError::Decode {
            method: "chat.postMessage".to_owned(),
            detail: "response is missing `ts`".to_owned(),
        })
    }

    async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), PlatformError> {
        let mut payload = message_payload(channel_id, message);
        payload["user"] = Value::String(user_id.to_owned());

        self.post("chat.postEphemeral", payload)
            .await
            .map(|_| ())
            .map_err(|error| channel_scoped(error, channel_id))
    }

    async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), PlatformError> {
        match self.post("chat.delete", json!({ "channel": channel_id, "ts": message_id })).await {
            Ok(_) => Ok(()),
            // Already gone is as good as deleted.
            Err(PlatformError::Api { error, .. }) if error == "message_not_found" => Ok(()),
            Err(error) => Err(channel_scoped(error, channel_id)),
        }
    }

    async fn list_recent_messages(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<RecentMessage>, PlatformError> {
        let identity = self.identity().await?;
        let body = self
            .get(
                "conversations.history",
                &[("channel", channel_id.to_owned()), ("limit", limit.to_string())],
            )
            .await
            .map_err(|error| channel_scoped(error, channel_id))?;

        recent_messages(&body, identity)
    }

    async fn channel_display_name(
        &self,
        channel_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        let body = self
            .get("conversations.info", &[("channel", channel_id.to_owned())])
            .await
            .map_err(|error| channel_scoped(error, channel_id))?;

        Ok(body["channel"]["name"]
            .as_str()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned))
    }
}

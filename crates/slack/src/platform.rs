use async_trait::async_trait;
use thiserror::Error;

use crate::blocks::MessageTemplate;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The channel does not exist or the bot cannot see it.
    #[error("channel `{0}` is unavailable")]
    ChannelNotFound(String),
    #[error("platform request failed: {0}")]
    Request(String),
    #[error("platform rejected `{method}`: {error}")]
    Api { method: String, error: String },
    #[error("platform response for `{method}` could not be decoded: {detail}")]
    Decode { method: String, detail: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentMessage {
    pub message_id: String,
    pub authored_by_self: bool,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Posts a message and returns its id.
    async fn send_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<String, PlatformError>;

    /// Posts a message only `user_id` can see.
    async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), PlatformError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str)
        -> Result<(), PlatformError>;

    /// Newest first, at most `limit` messages.
    async fn list_recent_messages(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<RecentMessage>, PlatformError>;

    /// `Ok(None)` when the channel has no usable name.
    async fn channel_display_name(&self, channel_id: &str)
        -> Result<Option<String>, PlatformError>;
}

/// Removes self-authored messages among the last `limit` in a channel.
///
/// Individual delete failures are logged and skipped. Listing failures are
/// returned so callers can decide whether the channel is usable at all.
pub async fn delete_own_recent_messages(
    platform: &dyn ChatPlatform,
    channel_id: &str,
    limit: u32,
) -> Result<usize, PlatformError> {
    let recent = platform.list_recent_messages(channel_id, limit).await?;
    let mut deleted = 0;

    for message in recent.iter().filter(|message| message.authored_by_self) {
        match platform.delete_message(channel_id, &message.message_id).await {
            Ok(()) => deleted += 1,
            Err(error) => {
                tracing::warn!(
                    event_name = "egress.slack.delete_failed",
                    channel_id,
                    message_id = %message.message_id,
                    error = %error,
                    "failed to delete previous bot message; continuing"
                );
            }
        }
    }

    Ok(deleted)
}

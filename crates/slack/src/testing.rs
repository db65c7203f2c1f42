//! In-memory [`ChatPlatform`] for handler and publisher tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::blocks::MessageTemplate;
use crate::platform::{ChatPlatform, PlatformError, RecentMessage};

#[derive(Default)]
struct ChannelState {
    name: Option<String>,
    /// Oldest first; `(id, authored_by_self)`.
    history: Vec<(String, bool)>,
}

#[derive(Default)]
struct FakeState {
    channels: HashMap<String, ChannelState>,
    broken_lookups: HashSet<String>,
    undeletable: HashSet<String>,
    sent: Vec<(String, MessageTemplate)>,
    ephemeral: Vec<(String, String, MessageTemplate)>,
    deleted: Vec<(String, String)>,
    next_id: u64,
}

#[derive(Default)]
pub(crate) struct FakeChatPlatform {
    state: Mutex<FakeState>,
}

impl FakeChatPlatform {
    pub(crate) async fn add_channel(&self, channel_id: &str, name: Option<&str>) {
        self.state.lock().await.channels.insert(
            channel_id.to_owned(),
            ChannelState { name: name.map(str::to_owned), history: Vec::new() },
        );
    }

    pub(crate) async fn seed_message(&self, channel_id: &str, message_id: &str, own: bool) {
        let mut state = self.state.lock().await;
        if let Some(channel) = state.channels.get_mut(channel_id) {
            channel.history.push((message_id.to_owned(), own));
        }
    }

    pub(crate) async fn break_lookup(&self, channel_id: &str) {
        self.state.lock().await.broken_lookups.insert(channel_id.to_owned());
    }

    pub(crate) async fn refuse_delete(&self, message_id: &str) {
        self.state.lock().await.undeletable.insert(message_id.to_owned());
    }

    pub(crate) async fn sent(&self) -> Vec<(String, MessageTemplate)> {
        self.state.lock().await.sent.clone()
    }

    pub(crate) async fn ephemeral(&self) -> Vec<(String, String, MessageTemplate)> {
        self.state.lock().await.ephemeral.clone()
    }

    pub(crate) async fn deleted(&self) -> Vec<(String, String)> {
        self.state.lock().await.deleted.clone()
    }

    pub(crate) async fn history(&self, channel_id: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .channels
            .get(channel_id)
            .map(|channel| channel.history.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatPlatform for FakeChatPlatform {
    async fn send_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<String, PlatformError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let message_id = format!("ts-{}", state.next_id);
        let channel = state
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| PlatformError::ChannelNotFound(channel_id.to_owned()))?;
        channel.history.push((message_id.clone(), true));
        state.sent.push((channel_id.to_owned(), message.clone()));
        Ok(message_id)
    }

    async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        if !state.channels.contains_key(channel_id) {
            return Err(PlatformError::ChannelNotFound(channel_id.to_owned()));
        }
        state.ephemeral.push((channel_id.to_owned(), user_id.to_owned(), message.clone()));
        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().await;
        if state.undeletable.contains(message_id) {
            return Err(PlatformError::Api {
                method: "chat.delete".to_owned(),
                error: "cant_delete_message".to_owned(),
            });
        }
        let channel = state
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| PlatformError::ChannelNotFound(channel_id.to_owned()))?;
        channel.history.retain(|(id, _)| id != message_id);
        state.deleted.push((channel_id.to_owned(), message_id.to_owned()));
        Ok(())
    }

    async fn list_recent_messages(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<RecentMessage>, PlatformError> {
        let state = self.state.lock().await;
        let channel = state
            .channels
            .get(channel_id)
            .ok_or_else(|| PlatformError::ChannelNotFound(channel_id.to_owned()))?;
        Ok(channel
            .history
            .iter()
            .rev()
            .take(limit as usize)
            .map(|(id, own)| RecentMessage { message_id: id.clone(), authored_by_self: *own })
            .collect())
    }

    async fn channel_display_name(
        &self,
        channel_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        let state = self.state.lock().await;
        if state.broken_lookups.contains(channel_id) {
            return Err(PlatformError::Request("lookup timed out".to_owned()));
        }
        state
            .channels
            .get(channel_id)
            .map(|channel| channel.name.clone())
            .ok_or_else(|| PlatformError::ChannelNotFound(channel_id.to_owned()))
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use punchclock_core::domain::worker::{WorkerId, WorkerRecord};
use punchclock_core::ranking::{rank, render_lines};
use tracing::{debug, info, warn};

use crate::blocks::ranking_message;
use crate::platform::{delete_own_recent_messages, ChatPlatform, PlatformError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { message_id: String, entries: usize, removed: usize },
    /// The output channel could not be used; nothing was sent.
    Skipped { channel_id: String },
}

/// Replaces the leaderboard message in the ranking channel.
pub struct RankingPublisher {
    platform: Arc<dyn ChatPlatform>,
    channel_id: String,
    history_limit: u32,
    unit_label: String,
}

impl RankingPublisher {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        channel_id: impl Into<String>,
        history_limit: u32,
        unit_label: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
            history_limit,
            unit_label: unit_label.into(),
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Renders `snapshot` and swaps it in for the previous leaderboard.
    ///
    /// Not transactional: old messages are removed before the new one is
    /// sent, so a failed send leaves the channel without a leaderboard until
    /// the next publish.
    pub async fn publish(
        &self,
        snapshot: &[(WorkerId, WorkerRecord)],
    ) -> Result<PublishOutcome, PlatformError> {
        let entries = rank(snapshot);
        let names = self.display_names(snapshot).await;
        let lines = render_lines(&entries, &self.unit_label, |id| names.get(id).cloned());

        let removed = match delete_own_recent_messages(
            self.platform.as_ref(),
            &self.channel_id,
            self.history_limit,
        )
        .await
        {
            Ok(removed) => removed,
            Err(PlatformError::ChannelNotFound(_)) => return Ok(self.skipped()),
            Err(error) => return Err(error),
        };

        let message = ranking_message(&lines);
        let message_id = match self.platform.send_message(&self.channel_id, &message).await {
            Ok(message_id) => message_id,
            Err(PlatformError::ChannelNotFound(_)) => return Ok(self.skipped()),
            Err(error) => return Err(error),
        };

        info!(
            event_name = "ranking.published",
            channel_id = %self.channel_id,
            entries = entries.len(),
            removed,
            "ranking published"
        );
        Ok(PublishOutcome::Published { message_id, entries: entries.len(), removed })
    }

    async fn display_names(
        &self,
        snapshot: &[(WorkerId, WorkerRecord)],
    ) -> HashMap<WorkerId, String> {
        let mut names = HashMap::with_capacity(snapshot.len());
        for (worker_id, _) in snapshot {
            match self.platform.channel_display_name(worker_id.as_str()).await {
                Ok(Some(name)) => {
                    names.insert(worker_id.clone(), name);
                }
                Ok(None) => {}
                Err(error) => {
                    debug!(
                        event_name = "ranking.display_name_fallback",
                        worker_id = %worker_id,
                        error = %error,
                        "display name lookup failed; using fallback label"
                    );
                }
            }
        }
        names
    }

    fn skipped(&self) -> PublishOutcome {
        warn!(
            event_name = "ranking.channel_unavailable",
            channel_id = %self.channel_id,
            "ranking channel unavailable; skipping publish"
        );
        PublishOutcome::Skipped { channel_id: self.channel_id.clone() }
    }
}

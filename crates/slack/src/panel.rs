use std::sync::Arc;

use tracing::{info, warn};

use crate::blocks::clock_panel_message;
use crate::platform::{delete_own_recent_messages, ChatPlatform, PlatformError};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelReport {
    pub posted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Posts a fresh clock panel in every worker channel.
pub struct PanelPublisher {
    platform: Arc<dyn ChatPlatform>,
    history_limit: u32,
}

impl PanelPublisher {
    pub fn new(platform: Arc<dyn ChatPlatform>, history_limit: u32) -> Self {
        Self { platform, history_limit }
    }

    /// Channels that fail for any reason are skipped; one bad channel never
    /// keeps the others from getting a panel.
    pub async fn post_all(&self, channel_ids: &[String]) -> PanelReport {
        let mut report = PanelReport::default();

        for channel_id in channel_ids {
            match self.post(channel_id).await {
                Ok(()) => report.posted.push(channel_id.clone()),
                Err(error) => {
                    warn!(
                        event_name = "panel.channel_skipped",
                        channel_id = %channel_id,
                        error = %error,
                        "could not post clock panel; skipping channel"
                    );
                    report.skipped.push(channel_id.clone());
                }
            }
        }

        info!(
            event_name = "panel.posted",
            posted = report.posted.len(),
            skipped = report.skipped.len(),
            "clock panels refreshed"
        );
        report
    }

    async fn post(&self, channel_id: &str) -> Result<(), PlatformError> {
        delete_own_recent_messages(self.platform.as_ref(), channel_id, self.history_limit).await?;
        self.platform.send_message(channel_id, &clock_panel_message()).await?;
        Ok(())
    }
}

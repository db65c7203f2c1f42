use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use punchclock_core::domain::worker::WorkerId;
use punchclock_core::errors::ApplicationError;
use punchclock_core::ledger::AttendanceLedger;
use punchclock_core::ranking::format_total;
use tracing::{info, warn};

use crate::actions::ClockAction;
use crate::blocks::{
    clock_in_message, clock_out_message, notice_message, total_message,
    unregistered_channel_message, MessageTemplate,
};
use crate::events::{BlockActionEvent, BlockActionService, EventContext, EventHandlerError};
use crate::ranking::RankingPublisher;

/// Turns clock panel button presses into ledger operations.
///
/// The channel a button lives in is the worker's identity.
pub struct AttendanceActionService {
    ledger: Arc<AttendanceLedger>,
    publisher: RankingPublisher,
    worker_channels: HashSet<String>,
    unit_label: String,
}

impl AttendanceActionService {
    pub fn new(
        ledger: Arc<AttendanceLedger>,
        publisher: RankingPublisher,
        worker_channels: impl IntoIterator<Item = String>,
        unit_label: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            publisher,
            worker_channels: worker_channels.into_iter().collect(),
            unit_label: unit_label.into(),
        }
    }

    async fn clock_in(
        &self,
        worker_id: &WorkerId,
        event: &BlockActionEvent,
    ) -> Result<MessageTemplate, ApplicationError> {
        let now = event.occurred_at().unwrap_or_else(Utc::now);
        let outcome = self.ledger.clock_in(worker_id, now).await?;
        info!(
            event_name = "attendance.clocked_in",
            worker_id = %outcome.worker_id,
            clocked_in_at = %outcome.clocked_in_at,
            "worker clocked in"
        );
        Ok(clock_in_message())
    }

    async fn clock_out(
        &self,
        worker_id: &WorkerId,
        event: &BlockActionEvent,
    ) -> Result<MessageTemplate, ApplicationError> {
        let now = event.occurred_at().unwrap_or_else(Utc::now);
        let outcome = self.ledger.clock_out(worker_id, now).await?;
        info!(
            event_name = "attendance.clocked_out",
            worker_id = %outcome.worker_id,
            added_minutes = outcome.added_minutes,
            total_minutes = outcome.total_minutes,
            "worker clocked out"
        );

        let snapshot = self.ledger.snapshot().await;
        if let Err(error) = self.publisher.publish(&snapshot).await {
            warn!(
                event_name = "ranking.publish_failed",
                channel_id = %self.publisher.channel_id(),
                error = %error,
                "ranking publish failed after clock-out"
            );
        }

        Ok(clock_out_message(&format_total(outcome.added_minutes), &self.unit_label))
    }

    async fn total(&self, worker_id: &WorkerId) -> MessageTemplate {
        let total = self.ledger.query_total(worker_id).await;
        total_message(&format_total(total), &self.unit_label)
    }
}

#[async_trait]
impl BlockActionService for AttendanceActionService {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        let Some(action) = ClockAction::from_action_id(&event.action_id) else {
            return Ok(None);
        };

        if !self.worker_channels.contains(event.channel_id.trim()) {
            warn!(
                event_name = "attendance.unregistered_channel",
                correlation_id = %ctx.correlation_id,
                channel_id = %event.channel_id,
                action = action.label(),
                "clock action from a channel that is not a worker channel"
            );
            return Ok(Some(unregistered_channel_message()));
        }

        let worker_id = WorkerId::new(event.channel_id.trim());
        let result = match action {
            ClockAction::ClockIn => self.clock_in(&worker_id, event).await,
            ClockAction::ClockOut => self.clock_out(&worker_id, event).await,
            ClockAction::Total => Ok(self.total(&worker_id).await),
        };

        Ok(Some(result.unwrap_or_else(|error| {
            let error = error.into_interface(ctx.correlation_id.clone());
            info!(
                event_name = "attendance.action_rejected",
                correlation_id = %error.correlation_id(),
                worker_id = %worker_id,
                action = action.label(),
                error = %error,
                "clock action not applied"
            );
            notice_message(error.user_message())
        })))
    }
}

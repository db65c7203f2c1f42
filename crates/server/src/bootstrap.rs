use std::sync::Arc;

use punchclock_core::config::{AppConfig, ConfigError};
use punchclock_core::ledger::{AttendanceLedger, LedgerStore, StoreError};
use punchclock_db::JsonFileLedgerStore;
use punchclock_slack::attendance::AttendanceActionService;
use punchclock_slack::client::SlackWebClient;
use punchclock_slack::events::{BlockActionHandler, EventDispatcher};
use punchclock_slack::panel::PanelPublisher;
use punchclock_slack::platform::ChatPlatform;
use punchclock_slack::ranking::RankingPublisher;
use punchclock_slack::socket::{
    ReconnectPolicy, SlackSocketTransport, SocketModeRunner, SocketTransport,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub ledger: Arc<AttendanceLedger>,
    pub panels: PanelPublisher,
    pub slack_runner: Arc<SocketModeRunner>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("ledger could not be loaded: {0}")]
    LedgerLoad(#[source] StoreError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store: Arc<dyn LedgerStore> =
        Arc::new(JsonFileLedgerStore::new(&config.attendance.ledger_path));
    let ledger =
        Arc::new(AttendanceLedger::open(store).await.map_err(BootstrapError::LedgerLoad)?);
    info!(
        event_name = "system.bootstrap.ledger_loaded",
        correlation_id = "bootstrap",
        path = %config.attendance.ledger_path.display(),
        "attendance ledger ready"
    );

    let platform: Arc<dyn ChatPlatform> =
        Arc::new(SlackWebClient::new(config.slack.bot_token.clone()));
    let transport: Arc<dyn SocketTransport> =
        Arc::new(SlackSocketTransport::new(config.slack.app_token.clone()));

    Ok(assemble(config, ledger, platform, transport))
}

/// Wires handlers and publishers around an already opened ledger.
pub fn assemble(
    config: AppConfig,
    ledger: Arc<AttendanceLedger>,
    platform: Arc<dyn ChatPlatform>,
    transport: Arc<dyn SocketTransport>,
) -> Application {
    let publisher = RankingPublisher::new(
        Arc::clone(&platform),
        config.ranking.channel_id.clone(),
        config.ranking.history_limit,
        config.attendance.unit_label.clone(),
    );
    let service = AttendanceActionService::new(
        Arc::clone(&ledger),
        publisher,
        config.attendance.worker_channels.iter().cloned(),
        config.attendance.unit_label.clone(),
    );

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(BlockActionHandler::new(service));

    let slack_runner = SocketModeRunner::new(transport, dispatcher, ReconnectPolicy::default())
        .with_responder(Arc::clone(&platform));
    let panels = PanelPublisher::new(platform, config.attendance.panel_history_limit);

    Application { config, ledger, panels, slack_runner: Arc::new(slack_runner) }
}

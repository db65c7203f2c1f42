//! Slack Integration - Socket Mode bot interface
//!
//! This crate provides the Slack interface for punchclock:
//! - **Socket Mode** (`socket`, `wire`) - WebSocket connection to Slack (no public URL needed)
//! - **Events** (`events`) - button interactions and their dispatch
//! - **Attendance** (`attendance`) - clock-in / clock-out / total button handling
//! - **Publishing** (`ranking`, `panel`) - leaderboard and control panel messages
//! - **Web API** (`client`, `platform`) - outbound calls behind the `ChatPlatform` trait
//! - **Block Kit** (`blocks`) - message builders
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Socket Mode and Interactivity
//! 3. Grant `chat:write`, `channels:history`, `channels:read` (plus the
//!    `groups:*` equivalents for private worker channels)
//! 4. Set env vars: `PUNCHCLOCK_SLACK_APP_TOKEN`, `PUNCHCLOCK_SLACK_BOT_TOKEN`
//!
//! # Architecture
//!
//! ```text
//! Slack button → SocketModeRunner → EventDispatcher → AttendanceActionService → AttendanceLedger
//!                      ↓                                       ↓
//!              ephemeral reply ←─────────────────────── RankingPublisher → ranking channel
//! ```

pub mod actions;
pub mod attendance;
pub mod blocks;
pub mod client;
pub mod events;
pub mod panel;
pub mod platform;
pub mod ranking;
pub mod socket;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

//! Core of the punchclock attendance tracker.
//!
//! - `domain` - worker identity and per-worker records
//! - `ledger` - the clock-in/clock-out state machine and its persistence seam
//! - `ranking` - leaderboard ordering and line rendering
//! - `config` - layered configuration (defaults, file, env, overrides)
//! - `errors` - domain, application and interface error taxonomy

pub mod config;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod ranking;

pub use domain::worker::{WorkerId, WorkerRecord};
pub use errors::{ApplicationError, ClockError, InterfaceError};
pub use ledger::{
    AttendanceLedger, ClockIn, ClockOut, Ledger, LedgerDocument, LedgerStore, StoreError,
};
pub use ranking::{rank, render_lines, RankingEntry};

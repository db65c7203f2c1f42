//! Ledger store implementations.
//!
//! The `LedgerStore` trait lives in `punchclock-core`; this crate supplies
//! the on-disk JSON document used in production and an in-memory store for
//! tests and dry runs.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileLedgerStore;
pub use memory::InMemoryLedgerStore;

pub mod repositories;

pub use repositories::{InMemoryLedgerStore, JsonFileLedgerStore};

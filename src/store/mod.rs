// Version Stores - hosts for the ledger core
//
// Both are append-only and satisfy the same VersionStore contract:
// - memory: shared in-process ledger (tests, ephemeral gateway)
// - sqlite: durable ledger with WAL

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{setup_database, SqliteStore};

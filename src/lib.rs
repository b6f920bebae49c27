// Assets Ledger - Core Library
// Due-diligence records (customers, collateral, projects) on a versioned ledger.
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod records;
pub mod codec;          // Record Codec - JSON bytes for ledger storage
pub mod keys;           // Key Deriver - delimited composite keys
pub mod ledger;         // Host contract - LedgerStub, VersionStore, TxContext
pub mod events;         // Commit events, polled by the gateway
pub mod store;          // Memory + SQLite version stores
pub mod writer;         // State Writer
pub mod reader;         // State Reader
pub mod history;        // History Reconstructor
pub mod chaincode;      // Function dispatch
pub mod config;
pub mod import;         // CSV bulk import

#[cfg(feature = "server")]
pub mod gateway;

// Re-export commonly used types
pub use error::{LedgerError, LedgerResult};
pub use records::{
    CollateralInfo, CustomerAggregate, CustomerInfo, HistoryEntry, ProjectInfo, RecordType,
};
pub use codec::{decode, encode, LedgerRecord};
pub use keys::KeyBuilder;
pub use ledger::{
    CursorState, HistoryCursor, HistoryIterator, KeyModification, LedgerInfo, LedgerStub,
    TxContext, VersionStore,
};
pub use events::LedgerEvent;
pub use store::{MemoryStore, SqliteStore};
pub use writer::{write_collateral, write_customer, write_project};
pub use reader::read_customer_aggregate;
pub use history::{format_commit_time, read_history, COMMIT_TIME_FORMAT};
pub use chaincode::{execute, invoke, Function, Response};
pub use config::{GatewayConfig, LedgerConfig, SharedStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ⚙️ Configuration
// Shared settings for the CLI and the gateway.
// Precedence: command-line flag > environment (.env loaded by the binaries) > default.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::chaincode::CHAINCODE_NAME;
use crate::error::LedgerResult;
use crate::ledger::VersionStore;
use crate::store::{MemoryStore, SqliteStore};

pub type SharedStore = Arc<dyn VersionStore + Send + Sync>;

/// Ledger file the CLI falls back to when no path is configured
pub const DEFAULT_DB_FILE: &str = "assets-ledger.db";

#[derive(Args, Debug, Clone)]
pub struct LedgerConfig {
    /// SQLite ledger file (gateway: omit for an in-memory ledger; CLI: defaults to assets-ledger.db)
    #[arg(long, env = "ASSETS_LEDGER_DB")]
    pub db_path: Option<PathBuf>,

    /// Channel name reported in chain info
    #[arg(long, env = "ASSETS_LEDGER_CHANNEL", default_value = "mychannel")]
    pub channel: String,

    /// Chaincode name reported in chain info
    #[arg(long, env = "ASSETS_LEDGER_CHAINCODE", default_value = CHAINCODE_NAME)]
    pub chaincode: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            db_path: None,
            channel: "mychannel".to_string(),
            chaincode: CHAINCODE_NAME.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Explicit store handle; every invocation builds its own TxContext from it
    pub fn open_store(&self) -> LedgerResult<SharedStore> {
        match &self.db_path {
            Some(path) => Ok(Arc::new(SqliteStore::open(path)?)),
            None => {
                tracing::warn!("no database configured, using an in-memory ledger");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// Path the CLI persists to: the configured one, else DEFAULT_DB_FILE
    pub fn durable_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
    }

    /// Always SQLite-backed, so one-off invocations outlive the process
    pub fn open_durable_store(&self) -> LedgerResult<SharedStore> {
        Ok(Arc::new(SqliteStore::open(&self.durable_path())?))
    }
}

#[derive(Args, Debug, Clone)]
pub struct GatewayConfig {
    /// Listen address
    #[arg(long, env = "ASSETS_LEDGER_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Max events returned per poll
    #[arg(long, env = "ASSETS_LEDGER_EVENT_PAGE", default_value_t = 100)]
    pub event_page_size: usize,

    #[command(flatten)]
    pub ledger: LedgerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            listen_addr: "0.0.0.0:8080".to_string(),
            event_page_size: 100,
            ledger: LedgerConfig::default(),
        }
    }
}

/// Initialize logging with tracing. RUST_LOG overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

// 📒 Ledger Host Contract
// What the state-management core needs from the ledger that hosts it.
//
// Two layers:
// - LedgerStub:   what one invocation sees (get/put/history, scoped to a transaction)
// - VersionStore: the append-only versioned store a host commits into
//
// TxContext bridges the two: reads go straight to committed state, puts are
// buffered as a write set and appended atomically on commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;

// ============================================================================
// KEY MODIFICATION (one version of a key)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: Vec<u8>,
}

/// Host-side cursor over a key's versions, most recent first
pub trait HistoryIterator {
    /// Next version, `Ok(None)` once exhausted
    fn next_modification(&mut self) -> LedgerResult<Option<KeyModification>>;

    /// Release the host resource. Called exactly once by `HistoryCursor`.
    fn close(&mut self);
}

/// Iterator over versions the host already materialized
pub struct BufferedHistory {
    items: std::vec::IntoIter<KeyModification>,
}

impl BufferedHistory {
    pub fn new(items: Vec<KeyModification>) -> Self {
        BufferedHistory {
            items: items.into_iter(),
        }
    }
}

impl HistoryIterator for BufferedHistory {
    fn next_modification(&mut self) -> LedgerResult<Option<KeyModification>> {
        Ok(self.items.next())
    }

    fn close(&mut self) {
        // Drop whatever was not consumed
        self.items = Vec::new().into_iter();
    }
}

// ============================================================================
// HISTORY CURSOR (scoped iterator)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Opened,
    Advancing,
    Exhausted,
    Failed,
    Closed,
}

/// Scoped wrapper around a host iterator.
///
/// Opened -> {Advancing -> Advancing | Exhausted | Failed} -> Closed
///
/// `Closed` is reached on every path: explicitly via `close()` or on drop.
pub struct HistoryCursor {
    inner: Box<dyn HistoryIterator>,
    state: CursorState,
}

impl HistoryCursor {
    pub fn open<L: LedgerStub + ?Sized>(stub: &L, key: &str) -> LedgerResult<Self> {
        let inner = stub.history_for_key(key)?;
        Ok(HistoryCursor {
            inner,
            state: CursorState::Opened,
        })
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn advance(&mut self) -> LedgerResult<Option<KeyModification>> {
        match self.state {
            CursorState::Opened | CursorState::Advancing => {}
            CursorState::Exhausted => return Ok(None),
            CursorState::Failed | CursorState::Closed => {
                return Err(LedgerError::storage(format!(
                    "history cursor is {:?}",
                    self.state
                )))
            }
        }

        match self.inner.next_modification() {
            Ok(Some(modification)) => {
                self.state = CursorState::Advancing;
                Ok(Some(modification))
            }
            Ok(None) => {
                self.state = CursorState::Exhausted;
                Ok(None)
            }
            Err(err) => {
                self.state = CursorState::Failed;
                Err(err)
            }
        }
    }

    pub fn close(&mut self) {
        if self.state != CursorState::Closed {
            self.inner.close();
            self.state = CursorState::Closed;
        }
    }
}

impl Drop for HistoryCursor {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// LEDGER STUB (per-invocation view)
// ============================================================================

pub trait LedgerStub {
    /// Identifier of the transaction this invocation runs in
    fn tx_id(&self) -> &str;

    /// Latest committed value, `None` if the key was never written
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Stage a write; becomes a new version of `key` when the transaction commits
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()>;

    /// Every committed version of `key`, most recent first
    fn history_for_key(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>>;
}

// ============================================================================
// VERSION STORE (host side)
// ============================================================================

/// Write set of one transaction, ready to append
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub function: String,
    pub writes: Vec<(String, Vec<u8>)>,
}

/// Summary of the ledger (mirrors a chain-info query)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInfo {
    /// Number of committed transactions
    pub height: u64,
    /// Distinct keys ever written
    pub key_count: u64,
    pub current_tx_id: Option<String>,
    pub last_commit: Option<DateTime<Utc>>,
}

/// Append-only, versioned key-value store
pub trait VersionStore {
    fn latest(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Versions of `key`, most recent first
    fn history(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>>;

    /// Append every write as a new version, all or nothing. Returns the recorded event.
    fn commit(&self, record: &CommitRecord) -> LedgerResult<LedgerEvent>;

    fn info(&self) -> LedgerResult<LedgerInfo>;

    /// Events with sequence > `after`, oldest first, at most `limit`.
    /// With `customer` set, only events touching that customer's records count
    /// toward the page.
    fn events_after(
        &self,
        after: i64,
        customer: Option<&str>,
        limit: usize,
    ) -> LedgerResult<Vec<LedgerEvent>>;
}

// ============================================================================
// TRANSACTION CONTEXT
// ============================================================================

/// Transaction id: sha256(nonce || timestamp || function), hex encoded
pub fn new_tx_id(function: &str, timestamp: DateTime<Utc>) -> String {
    let nonce = uuid::Uuid::new_v4();
    let mut hasher = Sha256::new();
    hasher.update(nonce.as_bytes());
    hasher.update(timestamp.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    hasher.update(function.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One invocation's transaction against a `VersionStore`
pub struct TxContext<'s, S: VersionStore + ?Sized> {
    store: &'s S,
    tx_id: String,
    timestamp: DateTime<Utc>,
    function: String,
    writes: BTreeMap<String, Vec<u8>>,
}

impl<'s, S: VersionStore + ?Sized> TxContext<'s, S> {
    pub fn begin(store: &'s S, function: &str) -> Self {
        let timestamp = Utc::now();
        TxContext {
            store,
            tx_id: new_tx_id(function, timestamp),
            timestamp,
            function: function.to_string(),
            writes: BTreeMap::new(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Keys staged so far
    pub fn pending_keys(&self) -> Vec<&str> {
        self.writes.keys().map(String::as_str).collect()
    }

    /// Append the write set. A read-only transaction commits nothing and returns `None`.
    pub fn commit(self) -> LedgerResult<Option<LedgerEvent>> {
        if self.writes.is_empty() {
            return Ok(None);
        }

        let record = CommitRecord {
            tx_id: self.tx_id,
            timestamp: self.timestamp,
            function: self.function,
            writes: self.writes.into_iter().collect(),
        };

        let event = self.store.commit(&record)?;
        tracing::debug!(
            tx_id = %record.tx_id,
            function = %record.function,
            writes = record.writes.len(),
            "transaction committed"
        );
        Ok(Some(event))
    }
}

impl<'s, S: VersionStore + ?Sized> LedgerStub for TxContext<'s, S> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        self.store.latest(key)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        if key.is_empty() {
            return Err(LedgerError::validation("key can not be empty"));
        }
        // Last put within one transaction wins
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn history_for_key(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>> {
        self.store.history(key)
    }
}

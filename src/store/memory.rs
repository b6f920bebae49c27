// 🧠 In-Memory Version Store
// Append-only: every commit pushes new versions, nothing is ever removed.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::ledger::{
    BufferedHistory, CommitRecord, HistoryIterator, KeyModification, LedgerInfo, VersionStore,
};

#[derive(Default)]
struct MemoryState {
    /// ALL versions of every key, oldest first
    versions: HashMap<String, Vec<KeyModification>>,
    committed: HashSet<String>,
    events: Vec<LedgerEvent>,
    last_commit: Option<(String, DateTime<Utc>)>,
}

/// Cloning shares the underlying ledger
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::storage("memory store lock poisoned"))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::storage("memory store lock poisoned"))
    }
}

impl VersionStore for MemoryStore {
    fn latest(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        let state = self.read()?;
        Ok(state
            .versions
            .get(key)
            .and_then(|versions| versions.last())
            .map(|m| m.value.clone()))
    }

    fn history(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>> {
        let state = self.read()?;
        let mut items = state.versions.get(key).cloned().unwrap_or_default();
        items.reverse();
        Ok(Box::new(BufferedHistory::new(items)))
    }

    fn commit(&self, record: &CommitRecord) -> LedgerResult<LedgerEvent> {
        let mut state = self.write()?;

        if !state.committed.insert(record.tx_id.clone()) {
            return Err(LedgerError::storage(format!(
                "duplicate transaction id {}",
                record.tx_id
            )));
        }

        for (key, value) in &record.writes {
            state
                .versions
                .entry(key.clone())
                .or_default()
                .push(KeyModification {
                    tx_id: record.tx_id.clone(),
                    timestamp: record.timestamp,
                    value: value.clone(),
                });
        }

        let keys: Vec<&str> = record.writes.iter().map(|(k, _)| k.as_str()).collect();
        let event = LedgerEvent::new(
            state.events.len() as i64 + 1,
            &record.tx_id,
            &record.function,
            &keys,
            record.timestamp,
        );
        state.events.push(event.clone());
        state.last_commit = Some((record.tx_id.clone(), record.timestamp));

        Ok(event)
    }

    fn info(&self) -> LedgerResult<LedgerInfo> {
        let state = self.read()?;
        Ok(LedgerInfo {
            height: state.committed.len() as u64,
            key_count: state.versions.len() as u64,
            current_tx_id: state.last_commit.as_ref().map(|(tx, _)| tx.clone()),
            last_commit: state.last_commit.as_ref().map(|(_, at)| *at),
        })
    }

    fn events_after(
        &self,
        after: i64,
        customer: Option<&str>,
        limit: usize,
    ) -> LedgerResult<Vec<LedgerEvent>> {
        let state = self.read()?;
        Ok(state
            .events
            .iter()
            .filter(|e| e.sequence > after)
            .filter(|e| customer.map_or(true, |name| e.concerns(name)))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyBuilder;
    use crate::records::RecordType;

    fn commit(store: &MemoryStore, tx_id: &str, writes: &[(&str, &str)]) -> LedgerResult<LedgerEvent> {
        store.commit(&CommitRecord {
            tx_id: tx_id.to_string(),
            timestamp: Utc::now(),
            function: "test".to_string(),
            writes: writes
                .iter()
                .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                .collect(),
        })
    }

    fn drain(mut it: Box<dyn HistoryIterator>) -> Vec<KeyModification> {
        let mut out = Vec::new();
        while let Some(m) = it.next_modification().unwrap() {
            out.push(m);
        }
        it.close();
        out
    }

    #[test]
    fn test_history_most_recent_first() {
        let store = MemoryStore::new();
        commit(&store, "tx1", &[("k", "v1")]).unwrap();
        commit(&store, "tx2", &[("k", "v2")]).unwrap();
        commit(&store, "tx3", &[("other", "x")]).unwrap();

        let history = drain(store.history("k").unwrap());
        let tx_ids: Vec<&str> = history.iter().map(|m| m.tx_id.as_str()).collect();
        assert_eq!(tx_ids, vec!["tx2", "tx1"]);
        assert_eq!(store.latest("k").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_never_written_key() {
        let store = MemoryStore::new();
        assert_eq!(store.latest("missing").unwrap(), None);
        assert!(drain(store.history("missing").unwrap()).is_empty());
    }

    #[test]
    fn test_duplicate_tx_id_rejected() {
        let store = MemoryStore::new();
        commit(&store, "tx1", &[("k", "v1")]).unwrap();
        let err = commit(&store, "tx1", &[("k", "v2")]).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(drain(store.history("k").unwrap()).len(), 1);
    }

    #[test]
    fn test_info_and_events() {
        let store = MemoryStore::new();
        commit(&store, "tx1", &[("a", "1"), ("b", "2")]).unwrap();
        commit(&store, "tx2", &[("a", "3")]).unwrap();

        let info = store.info().unwrap();
        assert_eq!(info.height, 2);
        assert_eq!(info.key_count, 2);
        assert_eq!(info.current_tx_id.as_deref(), Some("tx2"));

        let events = store.events_after(0, None, 10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].tx_id, "tx2");
        assert_eq!(store.events_after(1, None, 10).unwrap().len(), 1);
        assert_eq!(store.events_after(0, None, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_customer_filter_applies_before_limit() {
        let store = MemoryStore::new();
        for (i, name) in ["A1", "A2", "A3", "Globex"].iter().enumerate() {
            let key = KeyBuilder::derive(name, RecordType::Customer).unwrap();
            commit(&store, &format!("tx{}", i), &[(key.as_str(), "{}")]).unwrap();
        }

        let events = store.events_after(0, Some("Globex"), 2).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, 4);
        assert!(store.events_after(4, Some("Globex"), 2).unwrap().is_empty());
        assert!(store.events_after(0, Some("Nobody"), 2).unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        commit(&store, "tx1", &[("k", "v")]).unwrap();
        assert_eq!(handle.latest("k").unwrap(), Some(b"v".to_vec()));
    }
}

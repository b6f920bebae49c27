// 📣 Ledger Events
// One event per committed transaction, appended at commit time.
//
// Nothing listens in the background: the gateway polls `events_after(seq, customer)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::KeyBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    /// Position in the event log (1-based, strictly increasing)
    pub sequence: i64,
    pub event_id: String,
    pub tx_id: String,
    /// Function that produced the transaction (e.g. "addCollateralInfo")
    pub function: String,
    /// Written keys, display form ("CollateralsInfo/Acme")
    pub keys: Vec<String>,
    pub committed_at: DateTime<Utc>,
}

impl LedgerEvent {
    pub fn new(
        sequence: i64,
        tx_id: &str,
        function: &str,
        raw_keys: &[&str],
        committed_at: DateTime<Utc>,
    ) -> Self {
        LedgerEvent {
            sequence,
            event_id: uuid::Uuid::new_v4().to_string(),
            tx_id: tx_id.to_string(),
            function: function.to_string(),
            keys: raw_keys.iter().map(|k| KeyBuilder::display(k)).collect(),
            committed_at,
        }
    }

    /// Does this event touch a record of `customer_name`?
    pub fn concerns(&self, customer_name: &str) -> bool {
        self.keys
            .iter()
            .any(|k| k.split_once('/').map_or(false, |(_, name)| name == customer_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordType;

    #[test]
    fn test_event_creation() {
        let key = KeyBuilder::derive("Acme", RecordType::Collateral).unwrap();
        let event = LedgerEvent::new(3, "tx-1", "addCollateralInfo", &[key.as_str()], Utc::now());

        assert_eq!(event.sequence, 3);
        assert_eq!(event.keys, vec!["CollateralsInfo/Acme".to_string()]);
        assert!(!event.event_id.is_empty());
        assert!(event.concerns("Acme"));
        assert!(!event.concerns("Acm"));
    }
}

// ⏳ History Reconstructor
// Walk the host's version log for one key and rebuild point-in-time snapshots.
//
// - Order: as delivered by the host (most recent first)
// - Time:  commit timestamp rendered in UTC with COMMIT_TIME_FORMAT
// - A bad payload aborts the whole history (no skip-and-continue)
// - The host cursor is closed on every exit path (HistoryCursor drop)

use chrono::{DateTime, Utc};

use crate::codec::{self, LedgerRecord};
use crate::error::LedgerResult;
use crate::keys::KeyBuilder;
use crate::ledger::{HistoryCursor, LedgerStub};
use crate::records::{CollateralInfo, CustomerInfo, HistoryEntry, ProjectInfo, RecordType};

/// Commit time layout, always UTC, whole seconds. Example: "2024-03-05 02:07:09 PM"
pub const COMMIT_TIME_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

pub fn format_commit_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format(COMMIT_TIME_FORMAT).to_string()
}

/// A record type that owns a ledger key of its own
pub trait TrackedRecord: LedgerRecord {
    const RECORD_TYPE: RecordType;
}

impl TrackedRecord for CustomerInfo {
    const RECORD_TYPE: RecordType = RecordType::Customer;
}

impl TrackedRecord for Vec<CollateralInfo> {
    const RECORD_TYPE: RecordType = RecordType::Collateral;
}

impl TrackedRecord for ProjectInfo {
    const RECORD_TYPE: RecordType = RecordType::Project;
}

pub fn read_history<L, T>(stub: &L, name: &str) -> LedgerResult<Vec<HistoryEntry<T>>>
where
    L: LedgerStub + ?Sized,
    T: TrackedRecord,
{
    let record_type = T::RECORD_TYPE;
    let key = KeyBuilder::derive(name, record_type)?;
    let mut cursor = HistoryCursor::open(stub, &key)?;

    let mut entries = Vec::new();
    while let Some(modification) = cursor.advance()? {
        let value = codec::decode::<T>(&modification.value)?;

        entries.push(HistoryEntry {
            transaction_id: modification.tx_id,
            commit_timestamp: format_commit_time(modification.timestamp),
            value,
        });
    }
    cursor.close();

    tracing::debug!(
        customer = %name,
        record = %record_type,
        versions = entries.len(),
        "history reconstructed"
    );
    Ok(entries)
}

/// History of `record_type`, encoded as a JSON list of entries
pub fn read_history_encoded<L: LedgerStub + ?Sized>(
    stub: &L,
    name: &str,
    record_type: RecordType,
) -> LedgerResult<Vec<u8>> {
    match record_type {
        RecordType::Customer => codec::encode_response(&read_history::<_, CustomerInfo>(stub, name)?),
        RecordType::Collateral => {
            codec::encode_response(&read_history::<_, Vec<CollateralInfo>>(stub, name)?)
        }
        RecordType::Project => codec::encode_response(&read_history::<_, ProjectInfo>(stub, name)?),
    }
}

// 📖 State Reader
// Compose a customer's aggregate view from its three sub-record keys.
// Read-only: never stages a write.

use crate::codec::{self, LedgerRecord};
use crate::error::{LedgerError, LedgerResult};
use crate::keys::KeyBuilder;
use crate::ledger::LedgerStub;
use crate::records::{CollateralInfo, CustomerAggregate, CustomerInfo, ProjectInfo, RecordType};
use crate::writer::ensure_customer_exists;

/// Absent sub-records decode to their zero value
fn read_record<L, T>(stub: &L, name: &str, record_type: RecordType) -> LedgerResult<T>
where
    L: LedgerStub + ?Sized,
    T: LedgerRecord,
{
    let key = KeyBuilder::derive(name, record_type)?;
    let bytes = stub.get_state(&key)?.unwrap_or_default();
    codec::decode(&bytes)
}

pub fn read_customer_aggregate<L: LedgerStub + ?Sized>(
    stub: &L,
    name: &str,
) -> LedgerResult<CustomerAggregate> {
    if name.is_empty() {
        return Err(LedgerError::validation("customer name can not be empty"));
    }

    ensure_customer_exists(stub, name)?;

    let aggregate = CustomerAggregate {
        name: name.to_string(),
        customer_info: read_record::<_, CustomerInfo>(stub, name, RecordType::Customer)?,
        collateral_info: read_record::<_, Vec<CollateralInfo>>(stub, name, RecordType::Collateral)?,
        project_info: read_record::<_, ProjectInfo>(stub, name, RecordType::Project)?,
    };

    tracing::debug!(
        customer = %name,
        collaterals = aggregate.collateral_info.len(),
        "customer aggregate assembled"
    );
    Ok(aggregate)
}

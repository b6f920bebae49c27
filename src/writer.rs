// ✍️ State Writer
// Validate positional args → derive key → existence check → encode → put.
//
// Exactly one key gains one new version per successful call.
// Collateral writes replace the whole list (no merge).

use crate::codec::{self, LedgerRecord};
use crate::error::{LedgerError, LedgerResult};
use crate::keys::KeyBuilder;
use crate::ledger::LedgerStub;
use crate::records::{CollateralInfo, CustomerInfo, ProjectInfo, RecordType};

/// Split `args` into the leading customer name and the remaining fields
fn split_name(args: &[String]) -> LedgerResult<(&str, &[String])> {
    let (name, fields) = args
        .split_first()
        .ok_or_else(|| LedgerError::validation("incorrect number of arguments: customer name is required"))?;

    if name.is_empty() {
        return Err(LedgerError::validation("customer name can not be empty"));
    }
    Ok((name.as_str(), fields))
}

fn expect_field_count(fields: &[String], expected: usize) -> LedgerResult<()> {
    if fields.len() != expected {
        return Err(LedgerError::validation(format!(
            "incorrect number of arguments: expected {} (name + {} fields), got {}",
            expected + 1,
            expected,
            fields.len() + 1
        )));
    }
    Ok(())
}

/// The customer record must exist before anything can hang off it.
/// Probes the key where CustomerInfo is actually stored.
pub fn ensure_customer_exists<L: LedgerStub + ?Sized>(stub: &L, name: &str) -> LedgerResult<()> {
    let key = KeyBuilder::derive(name, RecordType::Customer)?;
    match stub.get_state(&key)? {
        Some(bytes) if !bytes.is_empty() => Ok(()),
        _ => Err(LedgerError::not_found(format!("customer {} not found", name))),
    }
}

fn put_record<L, T>(stub: &mut L, name: &str, record_type: RecordType, record: &T) -> LedgerResult<()>
where
    L: LedgerStub + ?Sized,
    T: LedgerRecord,
{
    let key = KeyBuilder::derive(name, record_type)?;
    let bytes = codec::encode(record)?;
    stub.put_state(&key, bytes).map_err(|e| match e {
        LedgerError::Storage(msg) => LedgerError::storage(format!("put state error, {}", msg)),
        other => other,
    })?;

    tracing::info!(
        tx_id = %stub.tx_id(),
        customer = %name,
        record = %record_type,
        "record written"
    );
    Ok(())
}

/// args: name, id, code, type, registeredCapital, legalPerson,
///       foundedDate, businessTermDate, approvalDate, industry
pub fn write_customer<L: LedgerStub + ?Sized>(stub: &mut L, args: &[String]) -> LedgerResult<()> {
    let (name, fields) = split_name(args)?;
    expect_field_count(fields, CustomerInfo::FIELD_COUNT)?;

    let info = CustomerInfo::from_fields(fields);
    put_record(stub, name, RecordType::Customer, &info)
}

/// args: name, (collateralId, collateralName)+
pub fn write_collateral<L: LedgerStub + ?Sized>(stub: &mut L, args: &[String]) -> LedgerResult<()> {
    let (name, fields) = split_name(args)?;
    if fields.is_empty() || fields.len() % 2 != 0 {
        return Err(LedgerError::validation(format!(
            "incorrect number of arguments: collateral must come in id/name pairs, got {} trailing fields",
            fields.len()
        )));
    }

    ensure_customer_exists(&*stub, name)?;

    let collaterals: Vec<CollateralInfo> = fields
        .chunks_exact(2)
        .map(|pair| CollateralInfo::new(&pair[0], &pair[1]))
        .collect();

    put_record(stub, name, RecordType::Collateral, &collaterals)
}

/// args: name, projectName, projectId, type, industry, approvalDate, approved,
///       hasLimitedPartner, hasOwnFundsInvestment, bondAmount, investeeCompanyType
pub fn write_project<L: LedgerStub + ?Sized>(stub: &mut L, args: &[String]) -> LedgerResult<()> {
    let (name, fields) = split_name(args)?;
    expect_field_count(fields, ProjectInfo::FIELD_COUNT)?;

    ensure_customer_exists(&*stub, name)?;

    let info = ProjectInfo::from_fields(fields);
    put_record(stub, name, RecordType::Project, &info)
}

// 🧬 Record Codec
// Domain records <-> flat JSON bytes stored under a ledger key.
//
// Rules:
// - encode refuses records with empty required fields (no partial records on the ledger)
// - decode of empty bytes (absent key) yields the zero value, not an error

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{CollateralInfo, CustomerInfo, ProjectInfo};

/// A value that can be stored under a ledger key
pub trait LedgerRecord: Serialize + DeserializeOwned + Default {
    /// Names of required fields that are empty
    fn missing_fields(&self) -> Vec<String>;
}

fn empty_fields(pairs: &[(&str, &str)]) -> Vec<String> {
    pairs
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
}

impl LedgerRecord for CustomerInfo {
    fn missing_fields(&self) -> Vec<String> {
        empty_fields(&[
            ("id", self.id.as_str()),
            ("code", self.code.as_str()),
            ("type", self.customer_type.as_str()),
            ("registeredCapital", self.registered_capital.as_str()),
            ("legalPerson", self.legal_person.as_str()),
            ("foundedDate", self.founded_date.as_str()),
            ("businessTermDate", self.business_term_date.as_str()),
            ("approvalDate", self.approval_date.as_str()),
            ("industry", self.industry.as_str()),
        ])
    }
}

impl LedgerRecord for CollateralInfo {
    fn missing_fields(&self) -> Vec<String> {
        empty_fields(&[
            ("collateralId", self.collateral_id.as_str()),
            ("collateralName", self.collateral_name.as_str()),
        ])
    }
}

impl LedgerRecord for ProjectInfo {
    fn missing_fields(&self) -> Vec<String> {
        empty_fields(&[
            ("projectName", self.project_name.as_str()),
            ("projectId", self.project_id.as_str()),
            ("type", self.project_type.as_str()),
            ("industry", self.industry.as_str()),
            ("approvalDate", self.approval_date.as_str()),
            ("approved", self.approved.as_str()),
            ("hasLimitedPartner", self.has_limited_partner.as_str()),
            ("hasOwnFundsInvestment", self.has_own_funds_investment.as_str()),
            ("bondAmount", self.bond_amount.as_str()),
            ("investeeCompanyType", self.investee_company_type.as_str()),
        ])
    }
}

/// Collateral is stored as one list; every item must be complete
impl LedgerRecord for Vec<CollateralInfo> {
    fn missing_fields(&self) -> Vec<String> {
        self.iter()
            .enumerate()
            .flat_map(|(i, item)| {
                item.missing_fields()
                    .into_iter()
                    .map(move |field| format!("[{}].{}", i, field))
            })
            .collect()
    }
}

/// Serialize a record for storage
pub fn encode<T: LedgerRecord>(record: &T) -> LedgerResult<Vec<u8>> {
    let missing = record.missing_fields();
    if !missing.is_empty() {
        return Err(LedgerError::Encoding(format!(
            "required fields are empty: {}",
            missing.join(", ")
        )));
    }

    serde_json::to_vec(record).map_err(|e| LedgerError::Encoding(e.to_string()))
}

/// Deserialize a stored record; empty bytes decode to `T::default()`
pub fn decode<T: LedgerRecord>(bytes: &[u8]) -> LedgerResult<T> {
    if bytes.is_empty() {
        return Ok(T::default());
    }

    serde_json::from_slice(bytes).map_err(|e| LedgerError::Decoding(e.to_string()))
}

/// Serialize a response payload (aggregates, history lists)
pub fn encode_response<T: Serialize>(value: &T) -> LedgerResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| LedgerError::Encoding(e.to_string()))
}

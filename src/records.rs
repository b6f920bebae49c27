// 📇 Domain Records
// Due-diligence records kept on the ledger, one key per record type per customer.
//
// Identity: the customer name (never stored on its own, lives in the key)
// Values:   CustomerInfo, Vec<CollateralInfo>, ProjectInfo (each write = new version)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

// ============================================================================
// RECORD TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Customer,
    Collateral,
    Project,
}

impl RecordType {
    pub const ALL: [RecordType; 3] = [RecordType::Customer, RecordType::Collateral, RecordType::Project];

    /// Suffix token identifying the record type inside a ledger key
    pub fn suffix(&self) -> &'static str {
        match self {
            RecordType::Customer => "CustomerInfo",
            RecordType::Collateral => "CollateralsInfo",
            RecordType::Project => "ProjectInfo",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<RecordType> {
        RecordType::ALL.into_iter().find(|t| t.suffix() == suffix)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for RecordType {
    type Err = LedgerError;

    /// Accepts the suffix token or a short lowercase alias ("customer", "collateral", "project")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(t) = RecordType::from_suffix(s) {
            return Ok(t);
        }
        match s.to_lowercase().as_str() {
            "customer" => Ok(RecordType::Customer),
            "collateral" | "collaterals" => Ok(RecordType::Collateral),
            "project" => Ok(RecordType::Project),
            other => Err(LedgerError::validation(format!("unknown record type: {}", other))),
        }
    }
}

// ============================================================================
// CUSTOMER INFO
// ============================================================================

/// Registration details of a customer (company)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub id: String,
    /// Unified social credit code
    pub code: String,
    #[serde(rename = "type")]
    pub customer_type: String,
    pub registered_capital: String,
    pub legal_person: String,
    pub founded_date: String,
    pub business_term_date: String,
    pub approval_date: String,
    pub industry: String,
}

impl CustomerInfo {
    /// Number of positional attributes (excluding the customer name)
    pub const FIELD_COUNT: usize = 9;

    /// Build from positional attributes in wire order.
    /// Caller guarantees `fields.len() == FIELD_COUNT`.
    pub(crate) fn from_fields(fields: &[String]) -> Self {
        CustomerInfo {
            id: fields[0].clone(),
            code: fields[1].clone(),
            customer_type: fields[2].clone(),
            registered_capital: fields[3].clone(),
            legal_person: fields[4].clone(),
            founded_date: fields[5].clone(),
            business_term_date: fields[6].clone(),
            approval_date: fields[7].clone(),
            industry: fields[8].clone(),
        }
    }

    /// Positional attributes in wire order (inverse of `from_fields`)
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.code.clone(),
            self.customer_type.clone(),
            self.registered_capital.clone(),
            self.legal_person.clone(),
            self.founded_date.clone(),
            self.business_term_date.clone(),
            self.approval_date.clone(),
            self.industry.clone(),
        ]
    }
}

// ============================================================================
// COLLATERAL INFO
// ============================================================================

/// One pledged collateral item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralInfo {
    pub collateral_id: String,
    pub collateral_name: String,
}

impl CollateralInfo {
    pub fn new(collateral_id: &str, collateral_name: &str) -> Self {
        CollateralInfo {
            collateral_id: collateral_id.to_string(),
            collateral_name: collateral_name.to_string(),
        }
    }
}

// ============================================================================
// PROJECT INFO
// ============================================================================

/// Investment project attached to a customer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub project_name: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub industry: String,
    pub approval_date: String,
    pub approved: String,
    pub has_limited_partner: String,
    pub has_own_funds_investment: String,
    pub bond_amount: String,
    pub investee_company_type: String,
}

impl ProjectInfo {
    pub const FIELD_COUNT: usize = 10;

    /// Caller guarantees `fields.len() == FIELD_COUNT`.
    pub(crate) fn from_fields(fields: &[String]) -> Self {
        ProjectInfo {
            project_name: fields[0].clone(),
            project_id: fields[1].clone(),
            project_type: fields[2].clone(),
            industry: fields[3].clone(),
            approval_date: fields[4].clone(),
            approved: fields[5].clone(),
            has_limited_partner: fields[6].clone(),
            has_own_funds_investment: fields[7].clone(),
            bond_amount: fields[8].clone(),
            investee_company_type: fields[9].clone(),
        }
    }

    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.project_name.clone(),
            self.project_id.clone(),
            self.project_type.clone(),
            self.industry.clone(),
            self.approval_date.clone(),
            self.approved.clone(),
            self.has_limited_partner.clone(),
            self.has_own_funds_investment.clone(),
            self.bond_amount.clone(),
            self.investee_company_type.clone(),
        ]
    }
}

// ============================================================================
// READ-SIDE VIEWS
// ============================================================================

/// Everything on file for one customer (assembled on read, never stored)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAggregate {
    pub name: String,
    pub customer_info: CustomerInfo,
    pub collateral_info: Vec<CollateralInfo>,
    pub project_info: ProjectInfo,
}

/// One historical version of a key's value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry<T> {
    pub transaction_id: String,
    /// Commit time, rendered with `history::COMMIT_TIME_FORMAT` (UTC)
    pub commit_timestamp: String,
    pub value: T,
}

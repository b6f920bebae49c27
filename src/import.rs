// 📥 Bulk Import
// CSV of customers → one addCustomerInfo transaction per row.
//
// Header: name,id,code,type,registeredCapital,legalPerson,foundedDate,
//         businessTermDate,approvalDate,industry

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::chaincode::{execute, Function};
use crate::error::LedgerError;
use crate::ledger::VersionStore;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRow {
    pub name: String,
    pub id: String,
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

impl CustomerRow {
    /// Positional args for addCustomerInfo
    pub fn to_args(&self) -> Vec<String> {
        vec![
            self.name.clone(),
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

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    /// (1-based data row, error)
    pub failed: Vec<(usize, LedgerError)>,
    pub tx_ids: Vec<String>,
}

pub fn load_customers_from_reader<R: Read>(reader: R) -> Result<Vec<CustomerRow>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let row: CustomerRow = result.with_context(|| format!("Failed to deserialize customer row {}", i + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

pub fn load_customers(csv_path: &Path) -> Result<Vec<CustomerRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    load_customers_from_reader(file)
}

/// Submit every row; a bad row is reported and does not stop the rest
pub fn import_customers<S: VersionStore + ?Sized>(store: &S, rows: &[CustomerRow]) -> ImportReport {
    let mut report = ImportReport::default();

    for (i, row) in rows.iter().enumerate() {
        match execute(store, Function::AddCustomerInfo, &row.to_args()) {
            Ok(response) => {
                report.imported += 1;
                report.tx_ids.push(response.tx_id);
            }
            Err(err) => {
                tracing::warn!(row = i + 1, customer = %row.name, error = %err, "row rejected");
                report.failed.push((i + 1, err));
            }
        }
    }

    report
}

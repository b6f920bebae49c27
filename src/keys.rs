// 🔑 Composite Keys
// Ledger key for (customer name, record type).
//
// Layout: \0 <suffix> \0 <name> \0
// The record type comes first and every segment is closed by a delimiter,
// so "A"+"CustomerInfo" can never collide with or prefix another customer's key.

use crate::error::{LedgerError, LedgerResult};
use crate::records::RecordType;

/// Segment delimiter; not allowed inside customer names
pub const KEY_DELIMITER: char = '\u{0}';

pub struct KeyBuilder;

impl KeyBuilder {
    /// Derive the ledger key for one of a customer's records
    pub fn derive(customer_name: &str, record_type: RecordType) -> LedgerResult<String> {
        if customer_name.is_empty() {
            return Err(LedgerError::validation("customer name can not be empty"));
        }
        if customer_name.contains(KEY_DELIMITER) {
            return Err(LedgerError::validation(
                "customer name can not contain the NUL character",
            ));
        }

        Ok(format!(
            "{d}{suffix}{d}{name}{d}",
            d = KEY_DELIMITER,
            suffix = record_type.suffix(),
            name = customer_name,
        ))
    }

    /// Parse a key produced by `derive` back into its parts
    pub fn split(key: &str) -> Option<(RecordType, String)> {
        let inner = key.strip_prefix(KEY_DELIMITER)?.strip_suffix(KEY_DELIMITER)?;
        let (suffix, name) = inner.split_once(KEY_DELIMITER)?;
        if name.is_empty() || name.contains(KEY_DELIMITER) {
            return None;
        }
        Some((RecordType::from_suffix(suffix)?, name.to_string()))
    }

    /// Human-readable form (delimiters shown as '/')
    pub fn display(key: &str) -> String {
        key.trim_matches(KEY_DELIMITER).replace(KEY_DELIMITER, "/")
    }
}

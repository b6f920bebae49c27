// ⚠️ Error Taxonomy
// Every failure the ledger core can surface, one variant per kind.
//
// Nothing here is retried automatically. The caller decides:
// - Validation / NotFound → fix the request (or create the parent first)
// - Encoding / Decoding   → payload corruption, surfaced as-is
// - Storage               → host failure, reads may be retried

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or missing input
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced customer record is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Record could not be serialized (e.g. required field empty)
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Stored payload could not be deserialized
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Host read/write/iterator failure
    #[error("storage error: {0}")]
    Storage(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage(message.into())
    }

    /// Stable machine-readable code (used in gateway error bodies)
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::Encoding(_) => "ENCODING_ERROR",
            LedgerError::Decoding(_) => "DECODING_ERROR",
            LedgerError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Only host failures are worth resubmitting
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::validation("x").code(), "VALIDATION_ERROR");
        assert_eq!(LedgerError::not_found("x").code(), "NOT_FOUND");
        assert_eq!(LedgerError::Encoding("x".into()).code(), "ENCODING_ERROR");
        assert_eq!(LedgerError::Decoding("x".into()).code(), "DECODING_ERROR");
        assert_eq!(LedgerError::storage("x").code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_only_storage_is_retryable() {
        assert!(LedgerError::storage("disk").is_retryable());
        assert!(!LedgerError::validation("bad").is_retryable());
        assert!(!LedgerError::not_found("Acme").is_retryable());
    }

    #[test]
    fn test_display_includes_message() {
        let err = LedgerError::not_found("customer Acme");
        assert_eq!(err.to_string(), "not found: customer Acme");
    }
}

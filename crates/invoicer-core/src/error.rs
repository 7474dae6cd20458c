//! Error types for Invoicer core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing messages and decides whether they end the process.

use thiserror::Error;

use crate::model::InvoiceStatus;

/// Result type alias for Invoicer operations.
pub type Result<T> = std::result::Result<T, InvoicerError>;

/// Core error type for Invoicer operations.
#[derive(Debug, Error)]
pub enum InvoicerError {
    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Status transition to the status the invoice already has
    #[error("Invoice already has status {0}")]
    StatusUnchanged(InvoiceStatus),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (I/O, locking, atomic replace)
    #[error("Storage error: {0}")]
    Storage(String),

    /// A collection document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The invoice status was persisted but its audit entry was not
    #[error("Status updated but audit log failed: {0}")]
    AuditWriteFailed(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl InvoicerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, InvoicerError::NotFound(_))
    }

    /// True for input problems the caller can fix and retry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            InvoicerError::Validation(_) | InvoicerError::StatusUnchanged(_)
        )
    }
}

impl From<std::io::Error> for InvoicerError {
    fn from(err: std::io::Error) -> Self {
        InvoicerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for InvoicerError {
    fn from(err: serde_json::Error) -> Self {
        InvoicerError::Serialization(err.to_string())
    }
}

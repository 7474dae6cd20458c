//! # Invoicer Core
//!
//! Core library for Invoicer - a personal, single-operator invoicing manager.
//!
//! This crate provides the data model, the money rules, and the storage
//! abstraction independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **model**: Client, Invoice, LineItem, AuditEntry and the totals engine
//! - **money**: Exact decimal helpers (percentages, display, parsing)
//! - **storage**: Storage trait and the JSON document implementation
//! - **audit**: Status-change sequencing and audit history
//! - **backup**: tar.gz backup archive format

pub mod audit;
pub mod backup;
pub mod error;
pub mod fs;
pub mod model;
pub mod money;
pub mod storage;

pub use audit::AuditTrail;
pub use backup::{BackupArchive, BackupMetadata};
pub use error::{InvoicerError, Result};
pub use model::{
    generate_invoice_number, parse_invoice_number, AuditEntry, Client, Invoice, InvoiceStatus,
    LineItem, StatusTransition,
};
pub use money::Money;
pub use storage::{JsonStorage, Storage};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

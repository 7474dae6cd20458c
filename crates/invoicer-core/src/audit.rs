//! Audit trail for invoice status changes.
//!
//! A status change is two independent writes: the invoice, then its audit
//! entry. There is no transaction spanning both; if the second write fails
//! the status change stands and the caller gets
//! [`InvoicerError::AuditWriteFailed`].

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{InvoicerError, Result};
use crate::model::{AuditEntry, Invoice, InvoiceStatus, StatusTransition};
use crate::storage::Storage;

/// Records and reads status-change history through a [`Storage`].
pub struct AuditTrail<'a, S: Storage + ?Sized> {
    storage: &'a S,
}

impl<'a, S: Storage + ?Sized> AuditTrail<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Write the audit entry for an already-persisted transition.
    pub fn record(&self, transition: &StatusTransition) -> Result<AuditEntry> {
        let entry = transition.to_audit_entry();
        self.storage.save_audit_entry(&entry)?;
        Ok(entry)
    }

    /// Change `invoice` to `new_status`, persist it, then log the change.
    ///
    /// # Errors
    ///
    /// - `InvoicerError::StatusUnchanged` if the invoice already has
    ///   `new_status`; nothing is modified or written.
    /// - Any storage error from updating the invoice; the in-memory invoice
    ///   is restored and nothing is written.
    /// - `InvoicerError::AuditWriteFailed` if the invoice was saved but the
    ///   audit entry was not. The new status is kept.
    pub fn change_status(
        &self,
        invoice: &mut Invoice,
        new_status: InvoiceStatus,
        reason: Option<String>,
    ) -> Result<AuditEntry> {
        let previous = invoice.clone();
        let transition = invoice.update_status(new_status, reason)?;

        if let Err(err) = self.storage.update_invoice(invoice) {
            *invoice = previous;
            return Err(err);
        }

        match self.record(&transition) {
            Ok(entry) => {
                info!(
                    invoice = %transition.invoice_number,
                    from = %transition.from,
                    to = %transition.to,
                    "invoice status changed"
                );
                Ok(entry)
            }
            Err(err) => {
                warn!(
                    invoice = %transition.invoice_number,
                    error = %err,
                    "status persisted without audit entry"
                );
                Err(InvoicerError::AuditWriteFailed(err.to_string()))
            }
        }
    }

    /// Status changes for one invoice, oldest first.
    pub fn history(&self, invoice_id: Uuid) -> Result<Vec<AuditEntry>> {
        self.storage.get_audit_entries(invoice_id)
    }
}

//! Storage trait definition.
//!
//! The `Storage` trait is the only boundary the CLI, export and backup code
//! cross into persisted state. A different backend (an embedded key-value
//! store, for example) can sit behind it without changing any consumer.

use uuid::Uuid;

use crate::error::Result;
use crate::model::{AuditEntry, Client, Invoice};

/// Persistence interface for clients, invoices and audit entries.
///
/// All implementations must ensure:
/// - Every call is safe to make from several threads at once
/// - A mutation applies to the whole collection or not at all
/// - Lookups by ID or number that match nothing return `InvoicerError::NotFound`
/// - Collections keep insertion order
pub trait Storage: Send + Sync {
    // --- Client operations ---

    /// List all clients in insertion order.
    fn get_all_clients(&self) -> Result<Vec<Client>>;

    /// Get a client by ID.
    fn get_client(&self, id: Uuid) -> Result<Client>;

    /// Append a new client.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::Validation` if the client is invalid or its ID
    /// is already stored.
    fn save_client(&self, client: &Client) -> Result<()>;

    /// Replace the stored client with the same ID.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::NotFound` if no client has this ID.
    fn update_client(&self, client: &Client) -> Result<()>;

    /// Remove a client. Invoices that reference it are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::NotFound` if no client has this ID.
    fn delete_client(&self, id: Uuid) -> Result<()>;

    // --- Invoice operations ---

    /// List all invoices in insertion order.
    fn get_all_invoices(&self) -> Result<Vec<Invoice>>;

    /// Get an invoice by ID.
    fn get_invoice(&self, id: Uuid) -> Result<Invoice>;

    /// Get an invoice by its human-facing number (e.g. `2024-07`).
    fn get_invoice_by_number(&self, number: &str) -> Result<Invoice>;

    /// Append a new invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::Validation` if the ID or number is already used.
    fn save_invoice(&self, invoice: &Invoice) -> Result<()>;

    /// Replace the stored invoice with the same ID.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::NotFound` if no invoice has this ID.
    fn update_invoice(&self, invoice: &Invoice) -> Result<()>;

    /// Remove an invoice. Its audit entries are kept.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::NotFound` if no invoice has this ID.
    fn delete_invoice(&self, id: Uuid) -> Result<()>;

    /// All invoices referencing `client_id`, in insertion order.
    fn get_invoices_by_client(&self, client_id: Uuid) -> Result<Vec<Invoice>>;

    /// Next free sequence number for `year`: one more than the highest
    /// well-formed `YYYY-NN` number of that year, or 1 if there is none.
    fn get_next_invoice_number(&self, year: i32) -> Result<u32>;

    // --- Audit operations ---

    /// Append an audit entry. Entries are never updated or removed.
    fn save_audit_entry(&self, entry: &AuditEntry) -> Result<()>;

    /// Audit entries for one invoice, in the order they were written.
    fn get_audit_entries(&self, invoice_id: Uuid) -> Result<Vec<AuditEntry>>;
}

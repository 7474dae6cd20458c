//! Entity model: clients, invoices with line items, and audit entries.
//!
//! Derived monetary fields are private and only ever written by
//! [`Invoice::calculate_totals`] and [`LineItem::update_total`].

mod audit;
mod client;
mod invoice;
mod number;
mod status;

pub use audit::{AuditEntry, SYSTEM_ACTOR};
pub use client::Client;
pub use invoice::{Invoice, LineItem, DEFAULT_DUE_DAYS};
pub use number::{generate_invoice_number, parse_invoice_number};
pub use status::{InvoiceStatus, StatusTransition};

//! Storage abstraction and its JSON document implementation.

mod collection;
mod json;
mod traits;

pub use json::{JsonStorage, AUDIT_FILE, CLIENTS_FILE, INVOICES_FILE};
pub use traits::Storage;

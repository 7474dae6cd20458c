//! JSON document storage backend.
//!
//! Each collection lives in its own file under the data directory
//! (`clients.json`, `invoices.json`, `audit.json`). Every mutation reads the
//! whole collection, changes one entity, and rewrites the whole file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::collection::Collection;
use super::traits::Storage;
use crate::backup::BackupArchive;
use crate::error::{InvoicerError, Result};
use crate::model::{parse_invoice_number, AuditEntry, Client, Invoice};

pub const CLIENTS_FILE: &str = "clients.json";
pub const INVOICES_FILE: &str = "invoices.json";
pub const AUDIT_FILE: &str = "audit.json";

/// Storage backed by three flat JSON documents.
pub struct JsonStorage {
    data_dir: PathBuf,
    clients: Collection<Client>,
    invoices: Collection<Invoice>,
    audit: Collection<AuditEntry>,
}

impl JsonStorage {
    /// Open the store in `data_dir`, creating the directory and any missing
    /// collection file.
    ///
    /// Existing files are not read here; a malformed document surfaces as
    /// `InvoicerError::Serialization` on first access.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| {
            InvoicerError::Storage(format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let storage = Self {
            clients: Collection::open(&data_dir, CLIENTS_FILE, "clients")?,
            invoices: Collection::open(&data_dir, INVOICES_FILE, "invoices")?,
            audit: Collection::open(&data_dir, AUDIT_FILE, "audit")?,
            data_dir,
        };
        debug!(data_dir = %storage.data_dir.display(), "opened json storage");
        Ok(storage)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Snapshot every collection into a backup archive.
    pub fn export_archive(&self) -> Result<BackupArchive> {
        Ok(BackupArchive::new(
            self.clients.read()?,
            self.invoices.read()?,
            self.audit.read()?,
        ))
    }

    /// Replace every collection with the contents of `archive`.
    ///
    /// All three write locks are held for the duration, so no reader sees a
    /// mix of old and restored collections.
    pub fn restore_archive(&self, archive: &BackupArchive) -> Result<()> {
        archive.validate()?;

        let _clients = self.clients.write_guard()?;
        let _invoices = self.invoices.write_guard()?;
        let _audit = self.audit.write_guard()?;

        self.clients.store(&archive.clients)?;
        self.invoices.store(&archive.invoices)?;
        self.audit.store(&archive.audit)?;

        info!(
            clients = archive.clients.len(),
            invoices = archive.invoices.len(),
            audit_entries = archive.audit.len(),
            "restored collections from backup"
        );
        Ok(())
    }
}

impl Storage for JsonStorage {
    fn get_all_clients(&self) -> Result<Vec<Client>> {
        self.clients.read()
    }

    fn get_client(&self, id: Uuid) -> Result<Client> {
        self.clients
            .read()?
            .into_iter()
            .find(|client| client.id() == id)
            .ok_or_else(|| InvoicerError::NotFound(format!("Client {} not found", id)))
    }

    fn save_client(&self, client: &Client) -> Result<()> {
        client.validate()?;
        self.clients.mutate(|clients| {
            if clients.iter().any(|c| c.id() == client.id()) {
                return Err(InvoicerError::Validation(format!(
                    "Client {} already exists",
                    client.id()
                )));
            }
            clients.push(client.clone());
            Ok(())
        })
    }

    fn update_client(&self, client: &Client) -> Result<()> {
        client.validate()?;
        self.clients.mutate(|clients| {
            let slot = clients
                .iter_mut()
                .find(|c| c.id() == client.id())
                .ok_or_else(|| {
                    InvoicerError::NotFound(format!("Client {} not found", client.id()))
                })?;
            *slot = client.clone();
            Ok(())
        })
    }

    fn delete_client(&self, id: Uuid) -> Result<()> {
        self.clients.mutate(|clients| {
            let index = clients
                .iter()
                .position(|c| c.id() == id)
                .ok_or_else(|| InvoicerError::NotFound(format!("Client {} not found", id)))?;
            clients.remove(index);
            Ok(())
        })
    }

    fn get_all_invoices(&self) -> Result<Vec<Invoice>> {
        self.invoices.read()
    }

    fn get_invoice(&self, id: Uuid) -> Result<Invoice> {
        self.invoices
            .read()?
            .into_iter()
            .find(|invoice| invoice.id() == id)
            .ok_or_else(|| InvoicerError::NotFound(format!("Invoice {} not found", id)))
    }

    fn get_invoice_by_number(&self, number: &str) -> Result<Invoice> {
        self.invoices
            .read()?
            .into_iter()
            .find(|invoice| invoice.number() == number)
            .ok_or_else(|| InvoicerError::NotFound(format!("Invoice {} not found", number)))
    }

    fn save_invoice(&self, invoice: &Invoice) -> Result<()> {
        self.invoices.mutate(|invoices| {
            if invoices.iter().any(|i| i.id() == invoice.id()) {
                return Err(InvoicerError::Validation(format!(
                    "Invoice {} already exists",
                    invoice.id()
                )));
            }
            if invoices.iter().any(|i| i.number() == invoice.number()) {
                return Err(InvoicerError::Validation(format!(
                    "Invoice number {} is already used",
                    invoice.number()
                )));
            }
            invoices.push(invoice.clone());
            Ok(())
        })
    }

    fn update_invoice(&self, invoice: &Invoice) -> Result<()> {
        self.invoices.mutate(|invoices| {
            let index = invoices
                .iter()
                .position(|i| i.id() == invoice.id())
                .ok_or_else(|| {
                    InvoicerError::NotFound(format!("Invoice {} not found", invoice.id()))
                })?;
            if invoices
                .iter()
                .any(|i| i.id() != invoice.id() && i.number() == invoice.number())
            {
                return Err(InvoicerError::Validation(format!(
                    "Invoice number {} is already used",
                    invoice.number()
                )));
            }
            invoices[index] = invoice.clone();
            Ok(())
        })
    }

    fn delete_invoice(&self, id: Uuid) -> Result<()> {
        self.invoices.mutate(|invoices| {
            let index = invoices
                .iter()
                .position(|i| i.id() == id)
                .ok_or_else(|| InvoicerError::NotFound(format!("Invoice {} not found", id)))?;
            invoices.remove(index);
            Ok(())
        })
    }

    fn get_invoices_by_client(&self, client_id: Uuid) -> Result<Vec<Invoice>> {
        Ok(self
            .invoices
            .read()?
            .into_iter()
            .filter(|invoice| invoice.client_id() == client_id)
            .collect())
    }

    fn get_next_invoice_number(&self, year: i32) -> Result<u32> {
        let invoices = self.invoices.read()?;
        let mut skipped = 0usize;
        let mut highest = 0u32;
        for invoice in &invoices {
            match parse_invoice_number(invoice.number()) {
                Some((y, sequence)) if y == year => highest = highest.max(sequence),
                Some(_) => {}
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(year, skipped, "ignored malformed invoice numbers");
        }
        highest.checked_add(1).ok_or_else(|| {
            InvoicerError::Validation(format!("Invoice numbers for {} are exhausted", year))
        })
    }

    fn save_audit_entry(&self, entry: &AuditEntry) -> Result<()> {
        self.audit.mutate(|entries| {
            entries.push(entry.clone());
            Ok(())
        })
    }

    fn get_audit_entries(&self, invoice_id: Uuid) -> Result<Vec<AuditEntry>> {
        Ok(self
            .audit
            .read()?
            .into_iter()
            .filter(|entry| entry.invoice_id() == invoice_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_directory_and_files() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("data");

        let storage = JsonStorage::open(&data_dir).unwrap();

        assert_eq!(storage.data_dir(), data_dir);
        for file in [CLIENTS_FILE, INVOICES_FILE, AUDIT_FILE] {
            assert_eq!(fs::read_to_string(data_dir.join(file)).unwrap(), "[]");
        }
    }

    #[test]
    fn test_save_client_rejects_duplicate_id() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::open(dir.path()).unwrap();
        let client = Client::new("Acme", "", vec!["a@acme.com".into()], dec!(1)).unwrap();

        storage.save_client(&client).unwrap();
        let err = storage.save_client(&client).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(storage.get_all_clients().unwrap().len(), 1);
    }

    #[test]
    fn test_save_invoice_rejects_duplicate_number() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::open(dir.path()).unwrap();
        let client_id = Uuid::new_v4();

        storage
            .save_invoice(&Invoice::new(client_id, "Acme", "2024-01"))
            .unwrap();
        let err = storage
            .save_invoice(&Invoice::new(client_id, "Acme", "2024-01"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_next_invoice_number_is_per_year() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::open(dir.path()).unwrap();
        let client_id = Uuid::new_v4();
        for number in ["2023-09", "2024-01", "2024-02", "2024-05", "2024-xx"] {
            storage
                .save_invoice(&Invoice::new(client_id, "Acme", number))
                .unwrap();
        }

        assert_eq!(storage.get_next_invoice_number(2024).unwrap(), 6);
        assert_eq!(storage.get_next_invoice_number(2023).unwrap(), 10);
        assert_eq!(storage.get_next_invoice_number(2025).unwrap(), 1);
    }

    #[test]
    fn test_next_invoice_number_after_max_sequence_fails() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::open(dir.path()).unwrap();
        let number = format!("2024-{}", u32::MAX);
        storage
            .save_invoice(&Invoice::new(Uuid::new_v4(), "Acme", number))
            .unwrap();

        let err = storage.get_next_invoice_number(2024).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(storage.get_next_invoice_number(2025).unwrap(), 1);
    }
}

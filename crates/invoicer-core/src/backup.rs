//! Backup archive format.
//!
//! A backup is a gzipped tarball named `invoicer_backup_<timestamp>.tar.gz`:
//!
//! ```text
//! metadata.json           version, timestamp, hostname
//! data/clients.json
//! data/invoices.json
//! data/audit.json
//! config/config.toml      when a config file exists
//! templates/invoice.tex   when a custom template exists
//! ```
//!
//! Archives are written atomically and validated before anything is
//! restored from them.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{InvoicerError, Result};
use crate::model::{AuditEntry, Client, Invoice};

/// Archive format version written by this build.
pub const BACKUP_VERSION: &str = "1.0";

const METADATA_ENTRY: &str = "metadata.json";
const CLIENTS_ENTRY: &str = "data/clients.json";
const INVOICES_ENTRY: &str = "data/invoices.json";
const AUDIT_ENTRY: &str = "data/audit.json";
const CONFIG_ENTRY: &str = "config/config.toml";
const TEMPLATE_ENTRY: &str = "templates/invoice.tex";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub version: String,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Everything a backup carries, decoded.
///
/// `config` and `template` are raw file contents; the core crate does not
/// interpret them.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupArchive {
    pub metadata: BackupMetadata,
    pub clients: Vec<Client>,
    pub invoices: Vec<Invoice>,
    pub audit: Vec<AuditEntry>,
    pub config: Option<Vec<u8>>,
    pub template: Option<Vec<u8>>,
}

impl BackupArchive {
    pub fn new(clients: Vec<Client>, invoices: Vec<Invoice>, audit: Vec<AuditEntry>) -> Self {
        Self {
            metadata: BackupMetadata {
                version: BACKUP_VERSION.to_string(),
                created_at: Utc::now(),
                hostname: std::env::var("HOSTNAME")
                    .ok()
                    .filter(|h| !h.trim().is_empty()),
            },
            clients,
            invoices,
            audit,
            config: None,
            template: None,
        }
    }

    /// `invoicer_backup_<YYYY-MM-DD_HH-MM-SS>.tar.gz`
    pub fn file_name(&self) -> String {
        format!(
            "invoicer_backup_{}.tar.gz",
            self.metadata.created_at.format("%Y-%m-%d_%H-%M-%S")
        )
    }

    pub fn validate(&self) -> Result<()> {
        check_version(&self.metadata)
    }

    /// Encode the archive as a gzipped tarball.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mtime = u64::try_from(self.metadata.created_at.timestamp()).unwrap_or(0);
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

        append_entry(
            &mut builder,
            METADATA_ENTRY,
            &serde_json::to_vec_pretty(&self.metadata)?,
            mtime,
        )?;
        append_entry(
            &mut builder,
            CLIENTS_ENTRY,
            &serde_json::to_vec_pretty(&self.clients)?,
            mtime,
        )?;
        append_entry(
            &mut builder,
            INVOICES_ENTRY,
            &serde_json::to_vec_pretty(&self.invoices)?,
            mtime,
        )?;
        append_entry(
            &mut builder,
            AUDIT_ENTRY,
            &serde_json::to_vec_pretty(&self.audit)?,
            mtime,
        )?;
        if let Some(config) = &self.config {
            append_entry(&mut builder, CONFIG_ENTRY, config, mtime)?;
        }
        if let Some(template) = &self.template {
            append_entry(&mut builder, TEMPLATE_ENTRY, template, mtime)?;
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| InvoicerError::Storage(format!("Failed to finish backup: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| InvoicerError::Storage(format!("Failed to compress backup: {}", e)))
    }

    /// Write the archive into `dir` and return the file path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| {
            InvoicerError::Storage(format!(
                "Failed to create backup directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        let path = dir.join(self.file_name());
        crate::fs::write_atomic(&path, &self.to_bytes()?)?;
        info!(
            path = %path.display(),
            clients = self.clients.len(),
            invoices = self.invoices.len(),
            "backup written"
        );
        Ok(path)
    }

    /// Read and validate an archive.
    ///
    /// Data entries that are absent decode as empty collections. Unknown
    /// entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns `InvoicerError::Validation` if the file is not a gzipped
    /// tarball, has no `metadata.json`, holds a collection that does not
    /// decode, or has an unsupported version.
    pub fn read_from(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).map_err(|e| {
            InvoicerError::Storage(format!("Failed to open backup {}: {}", path.display(), e))
        })?;

        let mut metadata = None;
        let mut clients = Vec::new();
        let mut invoices = Vec::new();
        let mut audit = Vec::new();
        let mut config = None;
        let mut template = None;

        let mut tarball = tar::Archive::new(GzDecoder::new(file));
        for entry in tarball.entries().map_err(|e| invalid(path, e))? {
            let mut entry = entry.map_err(|e| invalid(path, e))?;
            if entry.header().entry_type() != tar::EntryType::Regular {
                continue;
            }
            let name = entry
                .path()
                .map_err(|e| invalid(path, e))?
                .to_string_lossy()
                .into_owned();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| invalid(path, e))?;

            match name.as_str() {
                METADATA_ENTRY => {
                    let decoded: BackupMetadata = decode_entry(path, &name, &bytes)?;
                    check_version(&decoded)?;
                    metadata = Some(decoded);
                }
                CLIENTS_ENTRY => clients = decode_entry(path, &name, &bytes)?,
                INVOICES_ENTRY => invoices = decode_entry(path, &name, &bytes)?,
                AUDIT_ENTRY => audit = decode_entry(path, &name, &bytes)?,
                CONFIG_ENTRY => config = Some(bytes),
                TEMPLATE_ENTRY => template = Some(bytes),
                other => warn!(entry = other, "skipping unknown backup entry"),
            }
        }

        let metadata = metadata.ok_or_else(|| invalid(path, "missing metadata.json"))?;
        Ok(Self {
            metadata,
            clients,
            invoices,
            audit,
            config,
            template,
        })
    }
}

fn check_version(metadata: &BackupMetadata) -> Result<()> {
    if metadata.version != BACKUP_VERSION {
        return Err(InvoicerError::Validation(format!(
            "Unsupported backup version: {}",
            metadata.version
        )));
    }
    Ok(())
}

fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    data: &[u8],
    mtime: u64,
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    header.set_cksum();
    builder
        .append_data(&mut header, name, data)
        .map_err(|e| InvoicerError::Storage(format!("Failed to add {} to backup: {}", name, e)))
}

fn decode_entry<T: DeserializeOwned>(path: &Path, name: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| invalid(path, format!("{}: {}", name, e)))
}

fn invalid(path: &Path, detail: impl std::fmt::Display) -> InvoicerError {
    InvoicerError::Validation(format!("Invalid backup file {}: {}", path.display(), detail))
}

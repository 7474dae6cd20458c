//! Filesystem utilities for atomic document replacement.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{InvoicerError, Result};

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error carrying both attempts' causes if the retry also fails.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        // Target exists on platforms without replacing rename.
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            // Don't leave a half-written sibling next to the collection.
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Replace `path` with `data` so that readers see either the old or the new
/// contents, never a truncated mix.
///
/// The bytes go to a sibling temp file which is synced before the rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| InvoicerError::Storage(format!("Invalid path: {}", path.display())))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| InvoicerError::Storage(format!("Invalid filename: {}", path.display())))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| InvoicerError::Storage(format!("System time error: {}", e)))?
        .as_nanos();
    let temp_path = parent.join(format!(".{}.{}.{}.tmp", filename, std::process::id(), nanos));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| {
            InvoicerError::Storage(format!(
                "Temp file create failed for {}: {}",
                path.display(),
                e
            ))
        })?;
    let written = file.write_all(data).and_then(|_| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(InvoicerError::Storage(format!(
            "Temp file write failed for {}: {}",
            path.display(),
            e
        )));
    }

    rename_with_fallback(&temp_path, path).map_err(|e| {
        InvoicerError::Storage(format!("Replacing {} failed: {}", path.display(), e))
    })
}

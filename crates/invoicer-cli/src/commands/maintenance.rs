use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use invoicer_core::{BackupArchive, JsonStorage};

use crate::app::AppContext;
use crate::cli::{BackupArgs, RestoreArgs};
use crate::config::InvoicerConfig;
use crate::export::TEMPLATE_FILE;
use crate::ui::{kv, print, UiContext};

use super::{done, warn_line};

pub fn handle_backup(ctx: &AppContext, args: &BackupArgs) -> anyhow::Result<()> {
    let storage = ctx.open_storage()?;
    let destination = args
        .output
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let archive = snapshot(ctx, &storage)?;
    let path = archive.write_to_dir(&destination)?;

    let ui = UiContext::from_env(false);
    done(ctx, &ui, &format!("Backup written to {}", path.display()));
    if !ctx.quiet() {
        print(&ui, &kv(&ui, "Clients", &archive.clients.len().to_string()));
        print(&ui, &kv(&ui, "Invoices", &archive.invoices.len().to_string()));
        print(&ui, &kv(&ui, "Config", yes_no(archive.config.is_some())));
        print(&ui, &kv(&ui, "Template", yes_no(archive.template.is_some())));
    }
    Ok(())
}

pub fn handle_restore(ctx: &AppContext, args: &RestoreArgs) -> anyhow::Result<()> {
    let archive = BackupArchive::read_from(Path::new(&args.file))?;
    let storage = ctx.open_storage()?;
    let ui = UiContext::from_env(false);

    ctx.confirm(
        &format!(
            "Replace all data with {} client(s) and {} invoice(s) from {}?",
            archive.clients.len(),
            archive.invoices.len(),
            args.file
        ),
        args.yes,
    )?;

    // Safety copy of the current data; restore proceeds even if it fails.
    match snapshot(ctx, &storage)
        .and_then(|current| {
            current
                .write_to_dir(&std::env::temp_dir())
                .map_err(anyhow::Error::from)
        })
    {
        Ok(path) => {
            if !ctx.quiet() {
                print(&ui, &kv(&ui, "Pre-restore backup", &path.display().to_string()));
            }
        }
        Err(e) => {
            warn!(error = %e, "pre-restore backup failed");
            warn_line(&ui, &format!("Could not write pre-restore backup: {}", e));
        }
    }

    storage.restore_archive(&archive)?;

    if let Some(template) = &archive.template {
        let path = ctx.config()?.templates_dir().join(TEMPLATE_FILE);
        restore_file(&path, template)?;
    }
    if let Some(config) = &archive.config {
        match std::str::from_utf8(config)
            .map_err(|e| e.to_string())
            .and_then(|text| toml::from_str::<InvoicerConfig>(text).map_err(|e| e.to_string()))
        {
            Ok(_) => restore_file(&ctx.config_path()?, config)?,
            Err(e) => {
                warn!(error = %e, "backup config does not parse; keeping current config");
                warn_line(&ui, &format!("Skipped config from backup: {}", e));
            }
        }
    }

    done(
        ctx,
        &ui,
        &format!(
            "Restored backup from {}",
            archive.metadata.created_at.format("%Y-%m-%d %H:%M:%S")
        ),
    );
    Ok(())
}

/// Current data plus the config file and custom template, when present.
fn snapshot(ctx: &AppContext, storage: &JsonStorage) -> anyhow::Result<BackupArchive> {
    let mut archive = storage.export_archive()?;
    archive.config = read_if_exists(&ctx.config_path()?)?;
    archive.template = read_if_exists(&ctx.config()?.templates_dir().join(TEMPLATE_FILE))?;
    Ok(archive)
}

fn read_if_exists(path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow::anyhow!("Failed to read {}: {}", path.display(), e)),
    }
}

fn restore_file(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", parent.display(), e))?;
    }
    invoicer_core::fs::write_atomic(path, contents)?;
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

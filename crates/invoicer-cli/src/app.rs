//! Application context for the Invoicer CLI.
//!
//! Bundles the parsed CLI arguments with the lazily-resolved config so
//! handlers don't thread both around.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use invoicer_core::JsonStorage;

use crate::cli::Cli;
use crate::config::{default_config_path, load_config, InvoicerConfig};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<InvoicerConfig>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Config file path: `--config` / `INVOICER_CONFIG`, else the XDG default.
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match self.cli.config.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => default_config_path(),
        }
    }

    pub fn data_path_override(&self) -> Option<PathBuf> {
        self.cli
            .data_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Get the config, loading it on first use.
    pub fn config(&self) -> anyhow::Result<&InvoicerConfig> {
        self.config.get_or_try_init(|| {
            let path = self.config_path()?;
            load_config(&path, self.data_path_override().as_deref())
        })
    }

    /// Open the JSON store under the configured data directory.
    pub fn open_storage(&self) -> anyhow::Result<JsonStorage> {
        let config = self.config()?;
        config.ensure_directories()?;
        let storage = JsonStorage::open(config.data_dir())?;
        Ok(storage)
    }

    /// Ask for confirmation before a destructive action.
    ///
    /// `--yes` skips the prompt. Without a terminal there is no one to ask,
    /// so the action is refused.
    pub fn confirm(&self, prompt: &str, yes: bool) -> anyhow::Result<()> {
        if yes {
            return Ok(());
        }
        if !std::io::stdin().is_terminal() {
            return Err(anyhow::anyhow!(
                "Refusing to continue without confirmation. Pass --yes to proceed."
            ));
        }
        let proceed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        if !proceed {
            return Err(anyhow::anyhow!("Cancelled"));
        }
        Ok(())
    }
}

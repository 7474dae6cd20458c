use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use invoicer_core::model::DEFAULT_DUE_DAYS;

pub const DEFAULT_COMPANY_NAME: &str = "Your Company Name";
pub const DEFAULT_COMPANY_ADDRESS: &str = "123 Main St, City, Country";
pub const DEFAULT_COMPANY_EMAIL: &str = "billing@yourcompany.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicerConfig {
    pub storage: StorageSection,
    pub company: CompanySection,
    #[serde(default)]
    pub payment: PaymentSection,
    #[serde(default)]
    pub invoice: InvoiceSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    pub data_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySection {
    pub name: String,
    pub address: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentSection {
    pub zelle: Option<String>,
    pub venmo: Option<String>,
    pub bank_name: Option<String>,
    pub bank_routing: Option<String>,
    pub bank_account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSection {
    #[serde(default = "default_due_days")]
    pub default_due_days: i64,
    #[serde(default)]
    pub default_tax_rate: Decimal,
}

impl Default for InvoiceSection {
    fn default() -> Self {
        Self {
            default_due_days: DEFAULT_DUE_DAYS,
            default_tax_rate: Decimal::ZERO,
        }
    }
}

fn default_due_days() -> i64 {
    DEFAULT_DUE_DAYS
}

impl InvoicerConfig {
    /// Config with placeholder company details, used when only a data path
    /// is known.
    pub fn with_data_path(data_path: &Path) -> Self {
        Self {
            storage: StorageSection {
                data_path: data_path.to_string_lossy().to_string(),
            },
            company: CompanySection {
                name: DEFAULT_COMPANY_NAME.to_string(),
                address: DEFAULT_COMPANY_ADDRESS.to_string(),
                email: DEFAULT_COMPANY_EMAIL.to_string(),
            },
            payment: PaymentSection::default(),
            invoice: InvoiceSection::default(),
        }
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_path)
    }

    /// Directory holding the JSON collections.
    pub fn data_dir(&self) -> PathBuf {
        self.data_path().join("data")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.data_path().join("templates")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_path().join("exports")
    }

    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [
            self.data_path(),
            self.data_dir(),
            self.templates_dir(),
            self.exports_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                anyhow::anyhow!("Failed to create directory {}: {}", dir.display(), e)
            })?;
        }
        Ok(())
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_data_path() -> anyhow::Result<PathBuf> {
    xdg_config_dir()
}

pub fn read_config(path: &Path) -> anyhow::Result<InvoicerConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &InvoicerConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

/// Resolve the effective config.
///
/// A data path override wins and keeps any company/payment details from an
/// existing config file. Without an override the config file must exist.
pub fn load_config(
    config_path: &Path,
    data_path_override: Option<&Path>,
) -> anyhow::Result<InvoicerConfig> {
    let file = if config_path.exists() {
        Some(read_config(config_path)?)
    } else {
        None
    };

    match (file, data_path_override) {
        (Some(mut config), Some(data_path)) => {
            config.storage.data_path = data_path.to_string_lossy().to_string();
            Ok(config)
        }
        (None, Some(data_path)) => Ok(InvoicerConfig::with_data_path(data_path)),
        (Some(config), None) => Ok(config),
        (None, None) => Err(anyhow::anyhow!(
            "No config found at {}. Run `invoicer init` first.",
            config_path.display()
        )),
    }
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("invoicer"));
        }
    }
    Ok(home_dir()?.join(".config").join("invoicer"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoicer").join("config.toml");
        let mut config = InvoicerConfig::with_data_path(dir.path());
        config.payment.zelle = Some("me@example.com".to_string());
        config.invoice.default_tax_rate = dec!(8.25);

        write_config(&path, &config).unwrap();
        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\ndata_path = \"/tmp/inv\"\n\n[company]\nname = \"A\"\naddress = \"B\"\nemail = \"c@d.e\"\n",
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.invoice.default_due_days, DEFAULT_DUE_DAYS);
        assert_eq!(config.invoice.default_tax_rate, Decimal::ZERO);
        assert_eq!(config.payment, PaymentSection::default());
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/inv/data"));
    }

    #[test]
    fn test_load_config_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let override_path = dir.path().join("elsewhere");

        assert!(load_config(&path, None).is_err());

        let defaults = load_config(&path, Some(&override_path)).unwrap();
        assert_eq!(defaults.company.name, DEFAULT_COMPANY_NAME);
        assert_eq!(defaults.data_path(), override_path);

        let mut stored = InvoicerConfig::with_data_path(dir.path());
        stored.company.name = "Acme Consulting".to_string();
        write_config(&path, &stored).unwrap();

        assert_eq!(load_config(&path, None).unwrap(), stored);
        let overridden = load_config(&path, Some(&override_path)).unwrap();
        assert_eq!(overridden.company.name, "Acme Consulting");
        assert_eq!(overridden.data_path(), override_path);
    }
}

//! # Configuration
//!
//! TOML configuration for the warp registry and its admin tool.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "playerwarps.log"
//!
//! [warps]
//! # price of the 1st, 2nd, 3rd ... warp; the list length is the per-player limit
//! prices = [0, 500, 1500]
//! visit_reset_minutes = 60
//! default_icon = "COMPASS"
//! ```
//!
//! Every section except `[storage]` may be omitted and falls back to defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::warps::{Icon, PriceTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub warps: WarpsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Optional override for the sled database path; defaults to `<data_dir>/warps`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl StorageConfig {
    pub fn warp_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("warps"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// Ban/unban and bypass events are duplicated here when set.
    #[serde(default)]
    pub security_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            security_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpsConfig {
    /// Price of each successive warp a player buys.
    #[serde(default = "default_prices")]
    pub prices: Vec<i64>,
    /// Length of the visit dedup window.
    #[serde(default = "default_visit_reset_minutes")]
    pub visit_reset_minutes: u64,
    #[serde(default = "default_icon")]
    pub default_icon: String,
}

/// One week. Longer windows make the popularity ranking meaningless.
const MAX_VISIT_RESET_MINUTES: u64 = 7 * 24 * 60;

fn default_prices() -> Vec<i64> {
    vec![0, 500, 1500]
}

fn default_visit_reset_minutes() -> u64 {
    60
}

fn default_icon() -> String {
    Icon::default().as_str().to_string()
}

impl Default for WarpsConfig {
    fn default() -> Self {
        Self {
            prices: default_prices(),
            visit_reset_minutes: default_visit_reset_minutes(),
            default_icon: default_icon(),
        }
    }
}

impl WarpsConfig {
    pub fn price_table(&self) -> PriceTable {
        PriceTable::new(self.prices.clone())
    }

    pub fn visit_period(&self) -> Duration {
        Duration::from_secs(self.visit_reset_minutes.saturating_mul(60))
    }

    pub fn default_icon(&self) -> Result<Icon> {
        self.default_icon
            .parse()
            .map_err(|e| anyhow!("Invalid default_icon: {}", e))
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config = Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.warps.visit_reset_minutes == 0 {
            return Err(anyhow!("warps.visit_reset_minutes must be at least 1"));
        }
        if self.warps.visit_reset_minutes > MAX_VISIT_RESET_MINUTES {
            return Err(anyhow!(
                "warps.visit_reset_minutes must be at most {} (found {})",
                MAX_VISIT_RESET_MINUTES,
                self.warps.visit_reset_minutes
            ));
        }
        if let Some(price) = self.warps.prices.iter().find(|p| **p < 0) {
            return Err(anyhow!("warps.prices must not be negative (found {})", price));
        }
        self.warps.default_icon()?;
        Ok(())
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                db_path: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("playerwarps.log".to_string()),
                security_file: Some("playerwarps-security.log".to_string()),
            },
            warps: WarpsConfig::default(),
        }
    }
}

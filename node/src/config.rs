//! # Node Configuration
//!
//! The node reads a single TOML file:
//!
//! ```toml
//! [token]
//! name = "Tally Token"
//! symbol = "TLY"
//! decimals = 18
//! initial_supply = "50000000000000000000000000"
//! owner = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
//!
//! [api]
//! listen_addr = "127.0.0.1:9741"
//!
//! [metrics]
//! enabled = true
//! listen_addr = "127.0.0.1:9742"
//!
//! [storage]
//! snapshot_path = "tally-snapshot.json"
//! ```
//!
//! Only `[token]` is required. The genesis section is used only when no
//! snapshot exists yet; after that the snapshot is the source of truth.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tally_ledger::GenesisConfig;

/// Default API listen address.
pub const DEFAULT_API_ADDR: &str = "127.0.0.1:9741";

/// Default Prometheus listen address.
pub const DEFAULT_METRICS_ADDR: &str = "127.0.0.1:9742";

/// Full node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Genesis parameters for a fresh ledger.
    pub token: GenesisConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub listen_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_API_ADDR.to_string(),
        }
    }
}

/// Metrics endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: DEFAULT_METRICS_ADDR.to_string(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where the ledger snapshot is read at startup and written at shutdown.
    /// No persistence when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

impl NodeConfig {
    /// A config with default API, metrics and storage sections.
    pub fn with_genesis(token: GenesisConfig) -> Self {
        Self {
            token,
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: NodeConfig = toml::from_str(s).context("invalid node configuration")?;
        config
            .token
            .validate()
            .context("invalid [token] section")?;
        Ok(config)
    }

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Renders the config as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to encode configuration")
    }

    /// Writes the config to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("failed to write config file {}", path.display()))
    }
}

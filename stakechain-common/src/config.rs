// config.rs - Configuration for the ledger core
use crate::{
    database::DatabaseConfig,
    error::{LedgerError, LedgerResult},
    ledger_bail,
    types::{protocol::DEFAULT_REGISTRATION_FEE, Amount},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Protocol-wide constants. Every node on a network must agree on these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Exact value a DELEGATE transaction must carry
    pub registration_fee: Amount,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            registration_fee: DEFAULT_REGISTRATION_FEE,
        }
    }
}

/// Top-level ledger configuration, usually read from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Consensus constants
    pub protocol: ProtocolConfig,

    /// Storage backend settings
    pub database: DatabaseConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            protocol: ProtocolConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(input: &str) -> LedgerResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LedgerError::config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> LedgerResult<()> {
        if self.protocol.registration_fee == 0 {
            ledger_bail!(Config, "registration_fee must be greater than 0");
        }

        if self.database.path.is_empty() {
            ledger_bail!(Config, "database.path cannot be empty");
        }

        if self.database.max_open_files == 0 {
            ledger_bail!(Config, "database.max_open_files cannot be 0");
        }

        if !matches!(
            self.log_level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            ledger_bail!(Config, "unknown log_level '{}'", self.log_level);
        }

        Ok(())
    }
}

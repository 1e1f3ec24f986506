//! Cart configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CartError, CartResult};
use crate::money::NumberFormat;

/// Instance name used when none is selected.
pub const DEFAULT_INSTANCE: &str = "shop";

/// Prefix of every cart store key.
pub const DEFAULT_KEY_PREFIX: &str = "cart";

/// Cart configuration.
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```toml
/// default_instance = "shop"
/// key_prefix = "cart"
///
/// [number_format]
/// decimals = 2
/// decimal_point = ","
/// thousands_separator = "."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Instance selected when none is given.
    pub default_instance: String,
    /// Prefix joined to the instance name to form the store key.
    pub key_prefix: String,
    /// Default format for rendered amounts.
    pub number_format: NumberFormat,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            default_instance: DEFAULT_INSTANCE.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            number_format: NumberFormat::default(),
        }
    }
}

impl CartConfig {
    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> CartResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> CartResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CartError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> CartResult<()> {
        if self.default_instance.is_empty() {
            return Err(CartError::Config("default_instance must not be empty".into()));
        }
        if self.key_prefix.is_empty() {
            return Err(CartError::Config("key_prefix must not be empty".into()));
        }
        Ok(())
    }
}

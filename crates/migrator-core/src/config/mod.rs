mod database;
mod migrations;

pub use database::{DatabaseConfig, DEFAULT_DATABASE_URL};
pub use migrations::{MigrationsConfig, SplitMode, LEGACY_DESTRUCTIVE_MIGRATION};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{MigratorError, Result};

/// Root configuration for the migrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigratorConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration discovery and execution configuration.
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

impl MigratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MigratorError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Load configuration from a TOML file, or defaults when the file is absent.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content)?;

        toml::from_str(&content)
            .map_err(|e| MigratorError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Substitute environment variables in the format ${VAR_NAME}.
///
/// Unset variables are left in place.
fn substitute_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| MigratorError::Config(format!("Invalid substitution pattern: {}", e)))?;

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    Ok(result)
}

//! TOML-based configuration for logquery.
//!
//! Supports a config file (logquery.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [tables]
//! prefix = "${MATOMO_TABLE_PREFIX}"
//! conversion_item_joins_on_visit = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::log_table::{LogTableRegistry, RegistryOptions};
use crate::sql::StaticPrefix;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Physical table naming and join capabilities.
    pub tables: TableSettings,
}

/// Table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TableSettings {
    /// Prepended to every table name in FROM / JOIN (supports ${ENV_VAR} expansion).
    pub prefix: String,

    /// Whether conversion items can be joined directly on idvisit.
    pub conversion_item_joins_on_visit: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            conversion_item_joins_on_visit: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `LOGQUERY_CONFIG`
    /// 2. `./logquery.toml`
    /// 3. `~/.config/logquery/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("LOGQUERY_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("logquery.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("logquery").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            conversion_item_joins_on_visit: self.tables.conversion_item_joins_on_visit,
        }
    }

    pub fn registry(&self) -> LogTableRegistry {
        LogTableRegistry::new(self.registry_options())
    }

    /// The table prefix with environment variables expanded.
    pub fn prefix(&self) -> Result<StaticPrefix, SettingsError> {
        Ok(StaticPrefix(expand_env_vars(&self.tables.prefix)?))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}

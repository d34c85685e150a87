use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Application configuration (TOML file in the platform config dir).
///
/// Reminder settings (lead days, alert time) are user data, live in the
/// store and travel with backups; this file only holds machine-local
/// concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_photo_dir")]
    pub photo_dir: String,
    /// Days an expired record survives before the startup sweep removes it
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

/// Shared barcode catalog; disabled while no URL is configured
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            photo_dir: default_photo_dir(),
            retention_days: default_retention_days(),
            catalog: CatalogConfig::default(),
            notifications: NotificationsConfig::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

// Default value functions

fn default_database_path() -> String {
    // Fallback - the actual profile is applied at load time
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_photo_dir() -> String {
    Config::default_photo_dir_for_profile(utils::Profile::Prod)
}

fn default_retention_days() -> i64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing.
    /// Uses the provided profile to determine config and data paths.
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;

            // Ensure data paths match the profile (in case the config was
            // hand-edited to point at the other profile's store)
            config.database_path = Self::default_database_path_for_profile(profile);
            config.photo_dir = Self::default_photo_dir_for_profile(profile);

            Ok(config)
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.photo_dir = Self::default_photo_dir_for_profile(profile);
            config.save_with_profile(profile)?;
            Ok(config)
        }
    }

    /// Load configuration from file, using the production profile
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_profile(utils::Profile::Prod)
    }

    /// Save configuration to file
    pub fn save_with_profile(&mut self, profile: utils::Profile) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        let config_path = Self::get_config_path(profile)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("validade.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/validade-dev/validade.db".to_string(),
                utils::Profile::Prod => "~/.local/share/validade/validade.db".to_string(),
            }
        }
    }

    fn default_photo_dir_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("photos").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/validade-dev/photos".to_string(),
                utils::Profile::Prod => "~/.local/share/validade/photos".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Get the expanded photo directory (with ~ expansion)
    pub fn get_photo_dir(&self) -> PathBuf {
        utils::expand_path(&self.photo_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.retention_days, 5);
        assert!(config.notifications.enabled);
        assert!(config.catalog.base_url.is_empty());
        assert_eq!(config.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("retention_days = 9").unwrap();
        assert_eq!(config.retention_days, 9);
        assert!(config.notifications.enabled);
        assert!(config.catalog.base_url.is_empty());
    }

    #[test]
    fn catalog_section_parses() {
        let config: Config = toml::from_str(
            "[catalog]\nbase_url = \"https://catalog.example/api\"\n",
        )
        .unwrap();
        assert_eq!(config.catalog.base_url, "https://catalog.example/api");
    }
}

//! Configuration management for trackbridge.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/trackbridge/config.toml`
//! - **Windows**: `%APPDATA%\trackbridge\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use trackbridge_core::Config;
//!
//! let mut config = Config::load()?;
//! config.set("server.log_level", "debug")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "trackbridge";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Server identity and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Tool selection
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Name advertised in the handshake `serverInfo`
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Default log filter when no `-v` flag is given
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Tool selection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    /// Names of tools that must not be registered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_server_name() -> String {
    "trackbridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Whether a tool has been disabled in the config.
    pub fn is_tool_enabled(&self, name: &str) -> bool {
        !self.tools.disabled.iter().any(|d| d == name)
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `server.name`, `tools.disabled`).
    /// `tools.disabled` takes a comma-separated list.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match (section, field) {
            ("server", "name") => self.server.name = value.to_string(),
            ("server", "log_level") => self.server.log_level = value.to_string(),
            ("tools", "disabled") => {
                self.tools.disabled = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => return Err(Error::Config(format!("Unknown config key: {}", key))),
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    pub fn get(&self, key: &str) -> Result<String> {
        let (section, field) = split_key(key)?;

        match (section, field) {
            ("server", "name") => Ok(self.server.name.clone()),
            ("server", "log_level") => Ok(self.server.log_level.clone()),
            ("tools", "disabled") => Ok(self.tools.disabled.join(",")),
            _ => Err(Error::Config(format!("Unknown config key: {}", key))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.name, "trackbridge");
        assert_eq!(config.server.log_level, "info");
        assert!(config.tools.disabled.is_empty());
        assert!(config.is_tool_enabled("echo"));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config.set("server.name", "tracker-bridge").unwrap();
        config.set("server.log_level", "debug").unwrap();
        config.set("tools.disabled", "echo, join,").unwrap();

        assert_eq!(config.get("server.name").unwrap(), "tracker-bridge");
        assert_eq!(config.get("server.log_level").unwrap(), "debug");
        assert_eq!(config.tools.disabled, vec!["echo", "join"]);
        assert_eq!(config.get("tools.disabled").unwrap(), "echo,join");
        assert!(!config.is_tool_enabled("join"));
    }

    #[test]
    fn test_invalid_key() {
        let mut config = Config::default();

        assert!(config.set("invalid", "value").is_err());
        assert!(config.set("too.many.parts", "value").is_err());
        assert!(config.set("server.unknown", "value").is_err());
        assert!(config.get("unknown.field").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = Config::default();
        config.server.name = "bridge-test".to_string();
        config.tools.disabled = vec!["join".to_string()];

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("name = \"bridge-test\""));
        assert!(contents.contains("[tools]"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[server]\nlog_level = \"warn\"\n").unwrap();
        assert_eq!(parsed.server.name, "trackbridge");
        assert_eq!(parsed.server.log_level, "warn");
        assert!(parsed.tools.disabled.is_empty());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "server = [").unwrap();
        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

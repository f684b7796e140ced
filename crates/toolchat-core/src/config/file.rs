//! File-based tool-server configuration (JSON or YAML)

use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::Logger;

use super::error::{ConfigError, ConfigResult};
use super::servers::McpConfig;

/// File format, chosen by extension (`.yaml`/`.yml` → YAML, everything else → JSON)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

/// Default location: `<config_dir>/toolchat/mcp-config.json`
pub fn default_config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
    config_dir.join("toolchat").join("mcp-config.json")
}

impl McpConfig {
    /// Strictly parse a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content, ConfigFormat::from_path(path)).map_err(|message| {
            ConfigError::Parse {
                path: path.display().to_string(),
                message,
            }
        })
    }

    /// Parse configuration text in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, String> {
        let mut config: McpConfig = match format {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string())?,
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string())?,
        };
        config.fill_default_server();
        Ok(config)
    }

    /// Write the configuration, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| e.to_string()),
        }
        .map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })?;

        fs::write(path, content)?;
        Ok(())
    }
}

/// Load tool-server configuration, falling back to the built-in default.
///
/// Never fails: a missing file, a parse error or a config without servers all
/// log and return [`McpConfig::builtin`].
pub fn load_mcp_config(path: Option<&Path>, logger: &dyn Logger) -> McpConfig {
    let Some(path) = path else {
        return McpConfig::builtin();
    };

    if !path.exists() {
        logger.warn(&format!(
            "[Config] Configuration file not found at {}, using defaults",
            path.display()
        ));
        return McpConfig::builtin();
    }

    match McpConfig::from_file(path) {
        Ok(config) if config.servers.is_empty() => {
            logger.warn("[Config] No valid servers found in config, using defaults");
            McpConfig::builtin()
        }
        Ok(config) => config,
        Err(e) => {
            logger.error(&format!("[Config] Error loading MCP config: {}", e));
            McpConfig::builtin()
        }
    }
}

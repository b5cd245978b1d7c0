// ABOUTME: Configuration file loading, validation, and hierarchical merging for Imgur CLI
// ABOUTME: Supports TOML config files in XDG Base Directory locations plus a project-local file

use crate::constants::{config as paths, formats};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub default_title: Option<String>,
    #[serde(default, deserialize_with = "validate_timeout")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,
    #[serde(default, deserialize_with = "validate_format")]
    pub preferred_format: Option<String>,
}

impl Config {
    /// Load configuration from standard XDG-compliant locations
    pub fn load() -> Result<Self> {
        let paths = Self::get_config_paths();
        Self::load_from_paths(&paths)
    }

    /// Load configuration from file paths; later paths override earlier ones
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut config = Config::default();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let file_config = Self::load_from_file(path)?;
            log::debug!("Loaded config from {}", path.display());
            config = config.merge(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Standard config file paths, lowest precedence first
    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. User config directory fallback
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(
                home_dir
                    .join(".config")
                    .join(paths::APP_DIR)
                    .join(paths::FILE_NAME),
            );
        }

        // 2. XDG config home
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            let path = PathBuf::from(config_home)
                .join(paths::APP_DIR)
                .join(paths::FILE_NAME);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        // 3. Project-specific config (highest precedence)
        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join(paths::PROJECT_FILE_NAME));
        }

        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            client_id: other.client_id.or(self.client_id),
            default_title: other.default_title.or(self.default_title),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            endpoint: other.endpoint.or(self.endpoint),
            asset_dir: other.asset_dir.or(self.asset_dir),
            preferred_format: other.preferred_format.or(self.preferred_format),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref client_id) = self.client_id {
            if client_id.trim().is_empty() {
                return Err(anyhow!("client_id must not be empty"));
            }
        }

        if let Some(ref endpoint) = self.endpoint {
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(anyhow!(
                    "Invalid endpoint '{}'. Must be an http or https URL",
                    endpoint
                ));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn wants_json(&self) -> bool {
        self.preferred_format.as_deref() == Some(formats::JSON)
    }

    /// Pick the client ID: command-line flag, then environment, then config file
    pub fn resolve_client_id(&self, flag: Option<&str>) -> Option<String> {
        let present = |id: &String| !id.trim().is_empty();

        flag.map(str::to_string)
            .filter(present)
            .or_else(|| {
                std::env::var(imgur_sdk::constants::env::CLIENT_ID)
                    .ok()
                    .filter(present)
            })
            .or_else(|| self.client_id.clone().filter(present))
    }
}

// Custom deserializer for format validation
fn validate_format<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;

    if let Some(ref format) = value {
        if !formats::ALL.contains(&format.as_str()) {
            return Err(D::Error::custom(format!(
                "Invalid format '{}'. Must be one of: {}",
                format,
                formats::ALL.join(", ")
            )));
        }
    }
    Ok(value)
}

// Custom deserializer for timeout validation
fn validate_timeout<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<u64> = Option::deserialize(deserializer)?;

    match value {
        Some(0) => Err(D::Error::custom(
            "Invalid timeout_secs '0'. Must be at least 1 second",
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.client_id.is_none());
        assert!(config.timeout().is_none());
        assert!(!config.wants_json());
    }

    #[test]
    fn test_merge_configs() {
        let base = Config {
            client_id: Some("base-id".to_string()),
            default_title: Some("From base".to_string()),
            ..Default::default()
        };

        let override_config = Config {
            client_id: Some("override-id".to_string()),
            endpoint: Some("https://proxy.example.com/3/image".to_string()),
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.client_id, Some("override-id".to_string()));
        assert_eq!(merged.default_title, Some("From base".to_string()));
        assert_eq!(
            merged.endpoint,
            Some("https://proxy.example.com/3/image".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_blank_client_id() {
        let config = Config {
            client_id: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let config = Config {
            endpoint: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_paths_end_with_project_file() {
        let paths = Config::get_config_paths();
        assert!(paths
            .last()
            .map(|p| p.ends_with(paths::PROJECT_FILE_NAME))
            .unwrap_or(false));
    }
}

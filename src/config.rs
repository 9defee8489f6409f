//! Configuration persistence for lexideck.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::persistence::{default_store_path, StoreFormat};

/// Settings that persist between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the deck collection lives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Store encoding; inferred from the store path when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StoreFormat>,

    /// Seconds a play card stays hidden before the answer is revealed.
    #[serde(default = "default_think_seconds")]
    pub think_seconds: u64,

    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_think_seconds() -> u64 {
    5
}

fn default_color() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            format: None,
            think_seconds: default_think_seconds(),
            color: default_color(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lexideck")
            .join("config.toml")
    }

    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from `path`, returning default if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// The configured store path, or the default data location.
    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(default_store_path)
    }

    /// The configured format, else the one named by `path`'s extension, else JSON.
    pub fn resolved_format(&self, path: &Path) -> StoreFormat {
        self.format
            .or_else(|| StoreFormat::from_path(path))
            .unwrap_or(StoreFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.think_seconds, 5);
        assert!(config.color);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            store_path: Some(PathBuf::from("/tmp/decks.yaml")),
            format: Some(StoreFormat::Yaml),
            think_seconds: 2,
            color: false,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "format = \"xml\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.format, Some(StoreFormat::Xml));
        assert_eq!(config.think_seconds, 5);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "think_seconds = \"soon\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_resolved_format() {
        let mut config = Config::default();
        assert_eq!(config.resolved_format(Path::new("decks.yml")), StoreFormat::Yaml);
        assert_eq!(config.resolved_format(Path::new("decks.dat")), StoreFormat::Json);
        config.format = Some(StoreFormat::Xml);
        assert_eq!(config.resolved_format(Path::new("decks.yml")), StoreFormat::Xml);
    }
}

//! Library configuration, read from `.promptshelf/config.yaml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! `PROMPTSHELF_BACKEND` overrides `storage.backend` when set.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PromptshelfError, Result};

pub const CONFIG_FILE: &str = "config.yaml";
pub const BACKEND_ENV: &str = "PROMPTSHELF_BACKEND";
pub const LOG_ENV: &str = "PROMPTSHELF_LOG";

/// Which store implementation backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Loro when a library exists, in-memory sample data otherwise
    #[default]
    Auto,
    Loro,
    Memory,
}

impl std::str::FromStr for BackendChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(BackendChoice::Auto),
            "loro" | "disk" => Ok(BackendChoice::Loro),
            "memory" | "mock" => Ok(BackendChoice::Memory),
            _ => Err(format!("Invalid backend: {} (expected auto, loro or memory)", s)),
        }
    }
}

/// Where copied text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardChoice {
    #[default]
    System,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Prefix copies of prompts with variables with a legend
    pub legend: bool,
    pub clipboard: ClipboardChoice,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            legend: true,
            clipboard: ClipboardChoice::System,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Revisions kept per prompt before the oldest is dropped
    pub max_revisions: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_revisions: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShelfConfig {
    pub storage: StorageConfig,
    pub copy: CopyConfig,
    pub history: HistoryConfig,
}

impl ShelfConfig {
    /// Load the config from a `.promptshelf` directory, defaulting when the
    /// file does not exist.
    pub fn load(shelf_dir: &Path) -> Result<Self> {
        let path = shelf_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ShelfConfig = serde_yaml::from_str(text)?;
        if config.history.max_revisions == 0 {
            return Err(PromptshelfError::Config(
                "history.max_revisions must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Write the config file, creating nothing else.
    pub fn write(&self, shelf_dir: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self)?;
        fs::write(shelf_dir.join(CONFIG_FILE), text)?;
        Ok(())
    }

    /// Apply `PROMPTSHELF_BACKEND` if it is set.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(BACKEND_ENV) {
            self.storage.backend = value.parse().map_err(PromptshelfError::Config)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ShelfConfig::default();
        assert_eq!(config.storage.backend, BackendChoice::Auto);
        assert!(config.copy.legend);
        assert_eq!(config.copy.clipboard, ClipboardChoice::System);
        assert_eq!(config.history.max_revisions, 20);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ShelfConfig::from_yaml("copy:\n  legend: false\n").unwrap();
        assert!(!config.copy.legend);
        assert_eq!(config.storage.backend, BackendChoice::Auto);
        assert_eq!(config.history.max_revisions, 20);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = "storage:\n  backend: memory\ncopy:\n  clipboard: stdout\nhistory:\n  max_revisions: 3\n";
        let config = ShelfConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.storage.backend, BackendChoice::Memory);
        assert_eq!(config.copy.clipboard, ClipboardChoice::Stdout);
        assert_eq!(config.history.max_revisions, 3);
    }

    #[test]
    fn test_zero_revisions_rejected() {
        let result = ShelfConfig::from_yaml("history:\n  max_revisions: 0\n");
        assert!(matches!(result, Err(PromptshelfError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ShelfConfig::load(tmp.path()).unwrap();
        assert_eq!(config, ShelfConfig::default());
    }

    #[test]
    fn test_write_then_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = ShelfConfig::default();
        config.storage.backend = BackendChoice::Loro;
        config.write(tmp.path()).unwrap();

        let loaded = ShelfConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_backend_choice_parse() {
        assert_eq!("mock".parse::<BackendChoice>().unwrap(), BackendChoice::Memory);
        assert_eq!("LORO".parse::<BackendChoice>().unwrap(), BackendChoice::Loro);
        assert!("cloud".parse::<BackendChoice>().is_err());
    }
}

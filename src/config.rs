//! Application configuration stored as TOML
//!
//! Lives at `<config dir>/strudel-remote/config.toml`. Missing files are
//! created with defaults on startup; missing keys fall back to defaults.
//! Credentials are never stored here.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::mqtt::BrokerConfig;

const CONFIG_DIR: &str = "strudel-remote";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub ui: UiConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub fullscreen: bool,
    /// Whether the side menu starts expanded
    pub menu_open: bool,
    /// Number of session outcomes kept in the log view
    pub history_len: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            menu_open: false,
            history_len: 50,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| eyre!("No config directory available"))?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Writes a default config if none exists yet.
    pub async fn ensure_default_config(path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            return Ok(());
        }

        info!("No config found, writing defaults to {}", path.display());
        AppConfig::default().save(path).await
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

        config
            .broker
            .validate()
            .map_err(|e| eyre!("Invalid broker settings in {}: {}", path.display(), e))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        Ok(())
    }

    /// Resolves the config path, creating defaults first if needed.
    pub async fn load_or_init(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        Self::ensure_default_config(&path).await?;
        Self::load(&path).await
    }
}

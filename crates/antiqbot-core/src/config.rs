//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the backend base URL, where the session is persisted, and the last email
//! used to log in.
//!
//! Configuration is stored at `~/.config/antiqbot/config.json`. The base URL
//! can be overridden with the `ANTIQBOT_API_URL` environment variable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::auth::{FileStorage, KeyringStorage, Storage};

/// Application name used for config/cache directory paths and the keychain
pub const APP_NAME: &str = "antiqbot";

/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "ANTIQBOT_API_URL";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Subdirectory of the cache dir holding the file-backed session
const SESSION_DIR: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default)]
    pub session_backend: SessionBackend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend base URL: environment, then config file, then the default.
    pub fn api_url(&self) -> String {
        self.api_url_with_env(std::env::var(API_URL_ENV).ok())
    }

    fn api_url_with_env(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Storage backend for the persisted session.
    pub fn session_storage(&self) -> Result<Box<dyn Storage>> {
        match self.session_backend {
            SessionBackend::File => Ok(Box::new(FileStorage::new(
                self.cache_dir()?.join(SESSION_DIR),
            ))),
            SessionBackend::Keyring => Ok(Box::new(KeyringStorage::new(APP_NAME))),
        }
    }
}

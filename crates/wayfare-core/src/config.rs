//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the storage backend, an optional data directory override,
//! the last used email, and the session lifetime settings.
//!
//! Configuration is stored at `~/.config/wayfare/config.json`. A few fields
//! can be overridden from the environment (see `Config::apply_env`).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cookie::{SameSite, AUTH_COOKIE_NAME};
use crate::storage::{FileStorage, KeyValueStorage, KeyringStorage};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "wayfare";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Subdirectory of the data dir holding file-backed storage slots
const STORAGE_DIR: &str = "storage";

/// Storage slot holding the serialized session record
const DEFAULT_RECORD_KEY: &str = "wayfare.session";

const ENV_STORAGE: &str = "WAYFARE_STORAGE";
const ENV_DATA_DIR: &str = "WAYFARE_DATA_DIR";
const ENV_SESSION_TTL_HOURS: &str = "WAYFARE_SESSION_TTL_HOURS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::File => f.write_str("file"),
            StorageBackend::Keyring => f.write_str("keyring"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            other => Err(format!("unknown storage backend '{}' (expected file or keyring)", other)),
        }
    }
}

/// Session lifetime and naming settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage slot for the session record
    #[serde(default = "default_record_key")]
    pub record_key: String,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default)]
    pub same_site: SameSite,

    /// Lifetime of a new session
    #[serde(default = "default_ttl_hours")]
    pub default_ttl_hours: i64,

    /// Lifetime of a session opened with "remember me"
    #[serde(default = "default_remember_me_ttl_hours")]
    pub remember_me_ttl_hours: i64,

    /// How far `refresh` pushes the expiry out
    #[serde(default = "default_refresh_hours")]
    pub default_refresh_hours: i64,

    /// Threshold for the "expiring soon" warning
    #[serde(default = "default_expiring_soon_minutes")]
    pub expiring_soon_minutes: i64,
}

fn default_record_key() -> String {
    DEFAULT_RECORD_KEY.to_string()
}

fn default_cookie_name() -> String {
    AUTH_COOKIE_NAME.to_string()
}

fn default_ttl_hours() -> i64 {
    24
}

fn default_remember_me_ttl_hours() -> i64 {
    24 * 30
}

fn default_refresh_hours() -> i64 {
    24
}

fn default_expiring_soon_minutes() -> i64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            record_key: default_record_key(),
            cookie_name: default_cookie_name(),
            same_site: SameSite::default(),
            default_ttl_hours: default_ttl_hours(),
            remember_me_ttl_hours: default_remember_me_ttl_hours(),
            default_refresh_hours: default_refresh_hours(),
            expiring_soon_minutes: default_expiring_soon_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Persist `last_email` alone. Environment and command-line overrides
    /// applied to an in-memory `Config` stay out of the file.
    pub fn save_last_email(email: &str) -> Result<()> {
        Self::save_last_email_to(&Self::config_path()?, email)
    }

    pub fn save_last_email_to(path: &std::path::Path, email: &str) -> Result<()> {
        let mut on_disk = Self::load_from(path)?;
        on_disk.last_email = Some(email.trim().to_string());
        on_disk.save_to(path)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply overrides from the process environment
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(storage) = var(ENV_STORAGE) {
            self.storage = storage
                .parse::<StorageBackend>()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {}", ENV_STORAGE))?;
        }
        if let Some(dir) = var(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(ttl) = var(ENV_SESSION_TTL_HOURS) {
            let hours: i64 = ttl
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {}", ENV_SESSION_TTL_HOURS, ttl))?;
            if hours <= 0 {
                anyhow::bail!("{} must be positive, got {}", ENV_SESSION_TTL_HOURS, hours);
            }
            self.session.default_ttl_hours = hours;
        }
        Ok(())
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        let storage: Arc<dyn KeyValueStorage> = match self.storage {
            StorageBackend::File => {
                Arc::new(FileStorage::new(self.data_dir()?.join(STORAGE_DIR)))
            }
            StorageBackend::Keyring => Arc::new(KeyringStorage::new(APP_NAME)),
        };
        Ok(storage)
    }
}

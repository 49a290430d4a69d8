//! Application Configuration
//!
//! Manages user settings:
//! - Download location and release flavor
//! - Shared artifact cache directory
//! - Proxy settings
//!
//! The configuration is resolved once by the CLI entry point and handed to
//! every component; nothing below reads the environment on its own.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::channel::Channel;
use crate::error::{CrosspackError, Result};

/// Environment variable naming the shared artifact cache directory
pub const CACHE_DIR_ENV: &str = "CROSSWALK_APP_TOOLS_CACHE_DIR";

/// Default release server
pub const DEFAULT_BASE_URL: &str = "https://download.01.org/crosswalk/releases/";

/// Runtime release flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    #[default]
    Crosswalk,
    CrosswalkLite,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Crosswalk => "crosswalk",
            Flavor::CrosswalkLite => "crosswalk-lite",
        }
    }

    /// Channel used when the user gives no version specifier.
    /// Lite is only published on canary.
    pub fn default_channel(&self) -> Channel {
        match self {
            Flavor::Crosswalk => Channel::Stable,
            Flavor::CrosswalkLite => Channel::Canary,
        }
    }
}

/// Native word size of the Android release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WordSize {
    #[default]
    #[serde(rename = "32")]
    Bits32,
    #[serde(rename = "64")]
    Bits64,
}

impl WordSize {
    pub fn bits(&self) -> u32 {
        match self {
            WordSize::Bits32 => 32,
            WordSize::Bits64 => 64,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(WordSize::Bits32),
            64 => Some(WordSize::Bits64),
            _ => None,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Release server base URL, with trailing slash
    pub download_base_url: String,
    /// Shared directory of previously downloaded archives
    pub cache_dir: Option<PathBuf>,
    /// Channel used when no version specifier is given
    pub default_channel: Channel,
    /// Android release flavor
    pub flavor: Flavor,
    /// Android release word size
    pub android_word_size: WordSize,
    /// Proxy for plain HTTP downloads
    pub http_proxy: Option<String>,
    /// Proxy for HTTPS downloads
    pub https_proxy: Option<String>,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Verbose diagnostics
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            download_base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: None,
            default_channel: Channel::Stable,
            flavor: Flavor::Crosswalk,
            android_word_size: WordSize::Bits32,
            http_proxy: None,
            https_proxy: None,
            timeout_secs: 300,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("org", "crosspack", "crosspack")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the user config file, creating it with
    /// defaults when missing
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| CrosspackError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from a specific file
    pub async fn load_from(config_file: &Path) -> Result<Self> {
        if config_file.exists() {
            debug!("Loading config from {:?}", config_file);
            let contents = tokio::fs::read_to_string(config_file).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(config_file).await?;
            Ok(config)
        }
    }

    /// Save configuration to a specific file
    pub async fn save_to(&self, config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(config_file, contents).await?;

        debug!("Config saved to {:?}", config_file);
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` as the environment
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = non_empty(CACHE_DIR_ENV) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(proxy) = non_empty("http_proxy").or_else(|| non_empty("HTTP_PROXY")) {
            self.http_proxy = Some(proxy);
        }
        if let Some(proxy) = non_empty("https_proxy").or_else(|| non_empty("HTTPS_PROXY")) {
            self.https_proxy = Some(proxy);
        }
    }
}

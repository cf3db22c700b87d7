//! Configuration for the PuppetDB client.
//!
//! Config file resolution order:
//! 1. Explicit path passed to `Config::load_from()`
//! 2. PDQ_CONFIG environment variable
//! 3. Default: <XDG config dir>/pdq/config.toml
//!
//! PUPPETDB_URL, when set, overrides the `url` loaded from the file.
//! `load()` applies it; callers of `load_from()` use `with_env_overrides()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// PuppetDB client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the PuppetDB server.
    #[serde(default = "default_url")]
    pub url: String,

    /// API version prefix joined in front of endpoint paths.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<PathBuf>,

    /// Private key for `cert` (PEM). May be omitted if `cert` bundles it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,

    /// Extra CA certificate to trust (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

fn default_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_api_version() -> String {
    "/v3".to_string()
}

fn default_timeout_secs() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self::with_url(default_url())
    }
}

impl Config {
    /// Create a new config pointing at `url` with default settings.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            cert: None,
            key: None,
            ca_cert: None,
        }
    }

    /// Load config from the resolved location, then apply PUPPETDB_URL.
    pub fn load() -> Result<Self> {
        let path = resolve_config_path()?;
        Ok(Self::load_from(&path)?.with_env_overrides())
    }

    /// Apply PUPPETDB_URL on top of a loaded config.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_url_override(std::env::var("PUPPETDB_URL").ok());
        self
    }

    /// Load config from a specific file, or defaults if it does not exist.
    ///
    /// Environment overrides are not applied; see `with_env_overrides`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn apply_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.url = url;
        }
    }
}

/// Resolve the config file path using the standard resolution order.
pub fn resolve_config_path() -> Result<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var("PDQ_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    // 2. XDG config directory (via directories crate)
    if let Some(proj_dirs) = ProjectDirs::from("", "", "pdq") {
        return Ok(proj_dirs.config_dir().join("config.toml"));
    }

    // 3. Fallback to ~/.config/pdq
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".config/pdq/config.toml"))
}

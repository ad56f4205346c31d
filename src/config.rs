//! Triumph Tracker configuration management

use crate::error::{Error, Result};
use crate::triumphs::types::Hash;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Well-known root presentation node of the triumph hierarchy
pub const DEFAULT_ROOT_NODE_HASH: u32 = 1024788583;

/// Main Triumph Tracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Platform API configuration
    pub api: ApiConfig,

    /// Manifest cache configuration
    pub manifest: ManifestConfig,

    /// Triumph tree configuration
    pub triumphs: TriumphsConfig,

    /// Local HTTP server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,
}

impl TrackerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would only fail later at request time
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.media_base_url.trim().is_empty() {
            return Err(Error::Config(
                "api.media_base_url must not be empty".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api.timeout_secs must be positive".to_string()));
        }
        if self.manifest.language.trim().is_empty() {
            return Err(Error::Config("manifest.language must not be empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(Error::Config("server.port must not be 0".to_string()));
        }
        Ok(())
    }
}

/// Platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the platform REST API
    pub base_url: String,

    /// Base URL for media and manifest content paths
    pub media_base_url: String,

    /// Environment variable holding the API key
    pub api_key_ref: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.bungie.net/Platform".to_string(),
            media_base_url: "https://www.bungie.net".to_string(),
            api_key_ref: "BUNGIE_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// Tries the exact name first, then its UPPER_CASE form.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_ref)
            .or_else(|_| std::env::var(self.api_key_ref.to_uppercase()))
            .ok()
            .filter(|key| !key.is_empty())
    }
}

/// Manifest cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Directory holding downloaded definition tables
    pub cache_dir: PathBuf,

    /// Manifest language code
    pub language: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            cache_dir: data_dir().join("manifest"),
            language: "en".to_string(),
        }
    }
}

/// Triumph tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriumphsConfig {
    /// Root presentation node to walk from
    pub root_node_hash: Hash,
}

impl Default for TriumphsConfig {
    fn default() -> Self {
        Self {
            root_node_hash: Hash(DEFAULT_ROOT_NODE_HASH),
        }
    }
}

/// Local HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
            cors_origins: Vec::new(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File holding the tracked triumph hashes
    pub tracker_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tracker_file: data_dir().join("tracked.json"),
        }
    }
}

/// Base data directory (~/.local/share/triumph-tracker on Linux)
fn data_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .or_else(dirs_next::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("triumph-tracker")
}

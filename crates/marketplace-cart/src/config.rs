//! # Cart Configuration
//!
//! Configuration management for the cart store.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MARKETPLACE_CART_NAMESPACE=Staging                                 │
//! │     MARKETPLACE_DB_PATH=/data/cart.db                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/gomarketplace/cart.toml (Linux)                          │
//! │     ~/Library/Application Support/com.gomarketplace.app/cart.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     namespace "GoMarketplace", discard malformed blobs                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cart.toml
//! [storage]
//! namespace = "GoMarketplace"
//! database_path = "/path/to/cart.db"   # optional
//!
//! [hydration]
//! malformed_policy = "discard_blob"    # discard_blob | drop_entries
//!
//! [persistence]
//! shutdown_flush_timeout_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use marketplace_core::{storage_key, MalformedPolicy, DEFAULT_NAMESPACE};

use crate::error::{CartError, CartResult};

/// Environment variable overriding `storage.namespace`.
pub const ENV_NAMESPACE: &str = "MARKETPLACE_CART_NAMESPACE";
/// Environment variable overriding `storage.database_path`.
pub const ENV_DB_PATH: &str = "MARKETPLACE_DB_PATH";
/// Environment variable overriding `hydration.malformed_policy`.
pub const ENV_MALFORMED_POLICY: &str = "MARKETPLACE_MALFORMED_POLICY";
/// Environment variable overriding `persistence.shutdown_flush_timeout_ms`.
pub const ENV_FLUSH_TIMEOUT_MS: &str = "MARKETPLACE_FLUSH_TIMEOUT_MS";

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the cart blob lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Prefix of the storage key: the blob is stored under `@{namespace}:products`.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// SQLite file path. When unset the platform data directory is used.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            namespace: default_namespace(),
            database_path: None,
        }
    }
}

// =============================================================================
// Hydration Settings
// =============================================================================

/// How a persisted blob is treated at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HydrationSettings {
    /// What to do when the blob fails to parse or violates cart invariants.
    #[serde(default)]
    pub malformed_policy: MalformedPolicy,
}

// =============================================================================
// Persistence Settings
// =============================================================================

/// Writer behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// How long `CartStore::shutdown` waits for the last write.
    #[serde(default = "default_flush_timeout")]
    pub shutdown_flush_timeout_ms: u64,
}

fn default_flush_timeout() -> u64 {
    2000
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        PersistenceSettings {
            shutdown_flush_timeout_ms: default_flush_timeout(),
        }
    }
}

// =============================================================================
// Main Cart Configuration
// =============================================================================

/// Complete cart configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartConfig {
    /// Storage key and database location.
    #[serde(default)]
    pub storage: StorageSettings,

    /// Startup hydration settings.
    #[serde(default)]
    pub hydration: HydrationSettings,

    /// Persistence writer settings.
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

impl CartConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (cart.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CartResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|name| std::env::var(name).ok());

        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load cart config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CartResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CartError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CartError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| CartError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Cart config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CartResult<()> {
        let namespace = &self.storage.namespace;
        if namespace.trim().is_empty() {
            return Err(CartError::InvalidConfig(
                "storage.namespace must not be empty".into(),
            ));
        }

        // The key format uses ':' as its separator
        if namespace.contains(':') || namespace.chars().any(char::is_whitespace) {
            return Err(CartError::InvalidConfig(format!(
                "storage.namespace must not contain ':' or whitespace, got: '{}'",
                namespace
            )));
        }

        if self.persistence.shutdown_flush_timeout_ms == 0 {
            return Err(CartError::InvalidConfig(
                "shutdown_flush_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// [`CartConfig::load`]).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            debug!(namespace = %namespace, "Overriding cart namespace from environment");
            self.storage.namespace = namespace;
        }

        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(policy) = lookup(ENV_MALFORMED_POLICY) {
            match policy.parse() {
                Ok(parsed) => self.hydration.malformed_policy = parsed,
                Err(_) => warn!(policy = %policy, "Unknown malformed policy in environment"),
            }
        }

        if let Some(timeout) = lookup(ENV_FLUSH_TIMEOUT_MS) {
            match timeout.parse::<u64>() {
                Ok(ms) => self.persistence.shutdown_flush_timeout_ms = ms,
                Err(_) => warn!(timeout = %timeout, "Invalid flush timeout in environment"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "gomarketplace", "app")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("cart.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the key the cart blob is stored under.
    pub fn storage_key(&self) -> String {
        storage_key(&self.storage.namespace)
    }

    /// Returns the SQLite path: the configured one, or `cart.db` in the
    /// platform data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .database_path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join("cart.db")))
    }

    /// Returns the malformed-blob policy.
    pub fn malformed_policy(&self) -> MalformedPolicy {
        self.hydration.malformed_policy
    }

    /// Returns the shutdown flush timeout.
    pub fn shutdown_flush_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence.shutdown_flush_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CartConfig::default();
        assert_eq!(config.storage.namespace, "GoMarketplace");
        assert_eq!(config.storage_key(), "@GoMarketplace:products");
        assert_eq!(config.malformed_policy(), MalformedPolicy::DiscardBlob);
        assert_eq!(config.shutdown_flush_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CartConfig::default();

        config.storage.namespace = String::new();
        assert!(config.validate().is_err());

        config.storage.namespace = "Go:Market".into();
        assert!(config.validate().is_err());

        config.storage.namespace = "Staging".into();
        assert!(config.validate().is_ok());

        config.persistence.shutdown_flush_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_NAMESPACE, "Staging"),
            (ENV_DB_PATH, "/tmp/cart.db"),
            (ENV_MALFORMED_POLICY, "drop_entries"),
            (ENV_FLUSH_TIMEOUT_MS, "500"),
        ]
        .into_iter()
        .collect();

        let mut config = CartConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.storage_key(), "@Staging:products");
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/cart.db")));
        assert_eq!(config.malformed_policy(), MalformedPolicy::DropEntries);
        assert_eq!(config.persistence.shutdown_flush_timeout_ms, 500);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = CartConfig::default();
        config.apply_overrides(|name| match name {
            ENV_MALFORMED_POLICY => Some("explode".into()),
            ENV_FLUSH_TIMEOUT_MS => Some("soon".into()),
            _ => None,
        });

        assert_eq!(config.malformed_policy(), MalformedPolicy::DiscardBlob);
        assert_eq!(config.persistence.shutdown_flush_timeout_ms, 2000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: CartConfig = toml::from_str(
            r#"
            [hydration]
            malformed_policy = "drop_entries"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.namespace, "GoMarketplace");
        assert_eq!(config.malformed_policy(), MalformedPolicy::DropEntries);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cart.toml");

        let mut config = CartConfig::default();
        config.storage.namespace = "Saved".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[storage]"));
        assert!(contents.contains("[persistence]"));

        let loaded: CartConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.storage.namespace, "Saved");
    }
}

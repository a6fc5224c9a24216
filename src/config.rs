//! Configuration module for Course Market.
//!
//! Loads configuration from YAML files and environment variables.

use std::path::PathBuf;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::GateStrategy;
use crate::storage::StorageBackend;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which persistence strategy backs the catalog.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory holding `admins.json`, `users.json` and `courses.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// SQLite connection string.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// How protected routes verify callers.
    #[serde(default)]
    pub strategy: GateStrategy,
    /// Signing key for administrator tokens.
    #[serde(default)]
    pub admin_secret: String,
    /// Signing key for user tokens.
    #[serde(default)]
    pub user_secret: String,
    /// Issuer embedded in and required from every token.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// bcrypt work factor for stored secrets.
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_url() -> String {
    "sqlite://course_market.db".to_string()
}

fn default_issuer() -> String {
    "course-market".to_string()
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            database_url: default_database_url(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (COURSE_MARKET__*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("COURSE_MARKET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break role separation or hashing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;

        if auth.admin_secret.is_empty() || auth.user_secret.is_empty() {
            return Err(ConfigError::Message(
                "auth.admin_secret and auth.user_secret must both be set".to_string(),
            ));
        }
        if auth.admin_secret == auth.user_secret {
            return Err(ConfigError::Message(
                "auth.admin_secret and auth.user_secret must differ".to_string(),
            ));
        }
        if !(4..=31).contains(&auth.hash_cost) {
            return Err(ConfigError::Message(format!(
                "auth.hash_cost must be between 4 and 31, got {}",
                auth.hash_cost
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            storage: StorageConfig::default(),
            auth: AuthConfig {
                strategy: GateStrategy::SignedToken,
                admin_secret: "admin-signing-key".to_string(),
                user_secret: "user-signing-key".to_string(),
                issuer: default_issuer(),
                hash_cost: 4,
            },
        }
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();
        assert_eq!(storage.backend, StorageBackend::Memory);
        assert_eq!(storage.data_dir, PathBuf::from("data"));
        assert!(storage.database_url.starts_with("sqlite://"));
    }

    #[test]
    fn test_valid_config_passes() {
        tokio_test::assert_ok!(sample_config().validate());
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut config = sample_config();
        config.auth.user_secret = config.auth.admin_secret.clone();
        tokio_test::assert_err!(config.validate());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let mut config = sample_config();
        config.auth.admin_secret.clear();
        tokio_test::assert_err!(config.validate());
    }

    #[test]
    fn test_hash_cost_bounds() {
        let mut config = sample_config();
        config.auth.hash_cost = 3;
        tokio_test::assert_err!(config.validate());
        config.auth.hash_cost = 32;
        tokio_test::assert_err!(config.validate());
    }
}

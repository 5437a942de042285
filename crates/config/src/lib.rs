//! Configuration loading and seed-fixture parsing for aigentd.
//!
//! Loads configuration from a TOML file (path from `--config` or the
//! `AIGENTD_CONFIG` env var) with serde defaults for everything, so an
//! empty file is a valid configuration.

pub mod seed;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Bearer token → user id. The gateway's narrow identity seam: a request
    /// carrying one of these tokens acts as the mapped user.
    #[serde(default)]
    pub auth_tokens: HashMap<String, i64>,
}

impl AppConfig {
    /// Load from a TOML file. A missing optional section falls back to its
    /// default; secrets are never logged.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&text).map_err(|source| ConfigLoadError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

// Secrets stay out of Debug output.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("store", &self.store)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .field("auth_tokens", &format!("[{} token(s)]", self.auth_tokens.len()))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// SQLite database path (ignored by the memory backend).
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_backend() -> String {
    "sqlite".into()
}
fn default_db_path() -> String {
    "aigentd.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Fallback endpoint used when seeding aigents without explicit ones.
    #[serde(default = "default_endpoint")]
    pub default_endpoint: String,
}

fn default_endpoint() -> String {
    "http://localhost:11434".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_endpoint: default_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retry ceiling for transient model-call failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay; attempt N waits N * base seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.store.backend, "sqlite");
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.auth_tokens.is_empty());
    }

    #[test]
    fn partial_config_merges_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [store]
            backend = "memory"

            [auth_tokens]
            "secret-token" = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.auth_tokens["secret-token"], 1);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nmax_attempts = 5\nbase_delay_secs = 1").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_secs, 1);
    }

    #[test]
    fn debug_hides_tokens() {
        let mut config = AppConfig::default();
        config.auth_tokens.insert("super-secret".into(), 1);
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("1 token(s)"));
    }
}

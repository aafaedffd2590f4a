//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the node can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use blogchain_shared::constants::{ADDRESS_PREFIX, DEFAULT_HTTP_PORT, DEFAULT_THREAD_DEPTH};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) gateway.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:1317`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DB_PATH`
    /// Default: the platform data directory (see `Database::new`).
    pub db_path: Option<PathBuf>,

    /// Bech32 human-readable prefix every actor address must carry.
    /// Env: `ADDRESS_PREFIX`
    /// Default: `blogchain`
    pub address_prefix: String,

    /// Depth used for thread queries that do not name one.
    /// Env: `DEFAULT_THREAD_DEPTH`
    /// Default: `10`
    pub default_thread_depth: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            db_path: None,
            address_prefix: ADDRESS_PREFIX.to_string(),
            default_thread_depth: DEFAULT_THREAD_DEPTH,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(prefix) = lookup("ADDRESS_PREFIX") {
            if !prefix.is_empty() && prefix.is_ascii() {
                config.address_prefix = prefix;
            } else {
                tracing::warn!(value = %prefix, "Invalid ADDRESS_PREFIX, using default");
            }
        }

        if let Some(val) = lookup("DEFAULT_THREAD_DEPTH") {
            match val.parse::<u32>() {
                Ok(depth) => config.default_thread_depth = depth,
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "Invalid DEFAULT_THREAD_DEPTH, using default");
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 1317).into());
        assert_eq!(config.address_prefix, "blogchain");
        assert_eq!(config.default_thread_depth, 10);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_overrides_apply() {
        let config = load(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DB_PATH", "/tmp/chain.db"),
            ("ADDRESS_PREFIX", "test"),
            ("DEFAULT_THREAD_DEPTH", "3"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/chain.db")));
        assert_eq!(config.address_prefix, "test");
        assert_eq!(config.default_thread_depth, 3);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("HTTP_ADDR", "not an address"),
            ("DEFAULT_THREAD_DEPTH", "-1"),
            ("ADDRESS_PREFIX", ""),
        ]);
        assert_eq!(config, ServerConfig::default());
    }
}

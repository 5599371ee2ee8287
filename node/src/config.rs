//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::NodeError;

/// Configuration for an Ember node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Port the combined HTTP + peer-WebSocket server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Data directory holding the wallet key file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Peer WebSocket URLs to connect to on startup.
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,

    /// Seconds between keep-alive sends on each peer connection.
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,

    /// Delay, in milliseconds, between a new connection's chain-sync
    /// request and its mempool request. A soft ordering hint, not a
    /// barrier.
    #[serde(default = "default_mempool_sync_delay_ms")]
    pub mempool_sync_delay_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./ember_data")
}

fn default_keepalive_interval_secs() -> u64 {
    10
}

fn default_mempool_sync_delay_ms() -> u64 {
    1000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// Path of the wallet's private-key file.
    pub fn wallet_key_path(&self) -> PathBuf {
        self.data_dir.join("wallet.key")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            bootstrap_peers: Vec::new(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
            mempool_sync_delay_ms: default_mempool_sync_delay_ms(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.keepalive_interval_secs, config.keepalive_interval_secs);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 3000);
        assert_eq!(config.mempool_sync_delay_ms, 1000);
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 9999
            bootstrap_peers = ["ws://10.0.0.1:3000/peer"]
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 9999);
        assert_eq!(config.bootstrap_peers.len(), 1);
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/ember.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn wallet_key_lives_under_data_dir() {
        let config = NodeConfig {
            data_dir: PathBuf::from("/tmp/ember"),
            ..Default::default()
        };
        assert_eq!(config.wallet_key_path(), PathBuf::from("/tmp/ember/wallet.key"));
    }
}

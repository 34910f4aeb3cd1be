//! Agora configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use agora_chain::PluginKind;
use agora_governance::Ratio;
use agora_types::{Address, ChainId};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for reading one governance plugin.
///
/// Can be loaded from a TOML file via [`AgoraConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgoraConfig {
    /// Ethereum JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// IPFS HTTP gateway serving `/ipfs/<cid>`.
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: String,

    /// Expected chain; checked against `eth_chainId` when set.
    #[serde(default)]
    pub chain_id: Option<ChainId>,

    /// Governance plugin to read proposals from.
    #[serde(default)]
    pub plugin_address: Address,

    /// Voting variant of the plugin: "token_voting" or "optimistic".
    #[serde(default)]
    pub plugin_kind: PluginKind,

    /// Voting token. Read from the plugin (`getVotingToken()`) when absent.
    #[serde(default)]
    pub token_address: Option<Address>,

    /// Decimals used to render token amounts.
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,

    /// Overrides the per-proposal minimum veto ratio (parts per million).
    #[serde(default)]
    pub min_veto_ratio: Option<Ratio>,

    /// How often the head block is polled.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a cached proposal read stays fresh at an unchanged head.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Timeout for RPC and gateway requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_ipfs_gateway() -> String {
    "https://ipfs.io".to_string()
}

fn default_token_decimals() -> u8 {
    18
}

fn default_poll_interval_ms() -> u64 {
    12_000
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AgoraConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings no command can work with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.plugin_address.is_zero() {
            return Err(NodeError::Config("plugin_address is not set".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(NodeError::Config("poll_interval_ms must be positive".into()));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AgoraConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            ipfs_gateway: default_ipfs_gateway(),
            chain_id: None,
            plugin_address: Address::ZERO,
            plugin_kind: PluginKind::default(),
            token_address: None,
            token_decimals: default_token_decimals(),
            min_veto_ratio: None,
            poll_interval_ms: default_poll_interval_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

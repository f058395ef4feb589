//! # Agent Configuration
//!
//! Settings for the ledger connection, the identity source and the status
//! API. The report interval and the contract address are compile-time
//! constants and are not configurable.
//!
//! Precedence (lowest to highest): defaults, TOML file, environment
//! variables, CLI flags.
//!
//! ## Environment Variables
//!
//! - `STATUSHEART_RPC_URL`: JSON-RPC endpoint of the ledger node
//! - `STATUSHEART_FROM`: sending account (0x-hex)
//! - `STATUSHEART_IDENTITY`: path to the signer's identity JSON
//! - `STATUSHEART_STATUS_ADDR`: bind address for the status API
//! - `STATUSHEART_REQUEST_TIMEOUT`: per-request timeout, seconds
//! - `STATUSHEART_RECEIPT_TIMEOUT`: receipt wait limit, seconds
//! - `STATUSHEART_RECEIPT_POLL`: receipt poll period, seconds

use crate::gateway::RpcGatewayConfig;
use serde::Deserialize;
use statusheart_core::{Address, StatusHeartError, parse_chain_address};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "statusheart.toml";

/// Default JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Agent settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// JSON-RPC endpoint of the ledger node.
    pub rpc_url: String,
    /// Sending account, 0x-hex. The node's default account when unset.
    pub from: Option<String>,
    /// Identity JSON written by the signer.
    pub identity_path: Option<PathBuf>,
    /// Bind address for the status API; disabled when unset.
    pub status_addr: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// How long to wait for a receipt, in seconds.
    pub receipt_timeout_secs: u64,
    /// Receipt poll period in seconds.
    pub receipt_poll_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            from: None,
            identity_path: None,
            status_addr: None,
            request_timeout_secs: 30,
            receipt_timeout_secs: 300,
            receipt_poll_secs: 5,
        }
    }
}

impl AgentConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, StatusHeartError> {
        toml::from_str(text).map_err(|e| StatusHeartError::Config(format!("config: {e}")))
    }

    /// Read and parse the TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, StatusHeartError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            StatusHeartError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(StatusHeartError::Config(format!(
                "config '{}' is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            StatusHeartError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Load `explicit`, or [`DEFAULT_CONFIG_FILE`] if it exists, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, StatusHeartError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    tracing::info!("Using config file {}", DEFAULT_CONFIG_FILE);
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply overrides from process environment variables.
    pub fn apply_env(&mut self) -> Result<(), StatusHeartError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` (keyed by environment variable name).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), StatusHeartError> {
        if let Some(url) = lookup("STATUSHEART_RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(from) = lookup("STATUSHEART_FROM") {
            self.from = Some(from);
        }
        if let Some(path) = lookup("STATUSHEART_IDENTITY") {
            self.identity_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup("STATUSHEART_STATUS_ADDR") {
            self.status_addr = Some(addr);
        }
        if let Some(secs) = lookup("STATUSHEART_REQUEST_TIMEOUT") {
            self.request_timeout_secs = parse_secs("STATUSHEART_REQUEST_TIMEOUT", &secs)?;
        }
        if let Some(secs) = lookup("STATUSHEART_RECEIPT_TIMEOUT") {
            self.receipt_timeout_secs = parse_secs("STATUSHEART_RECEIPT_TIMEOUT", &secs)?;
        }
        if let Some(secs) = lookup("STATUSHEART_RECEIPT_POLL") {
            self.receipt_poll_secs = parse_secs("STATUSHEART_RECEIPT_POLL", &secs)?;
        }
        Ok(())
    }

    /// Sending account, parsed.
    pub fn from_address(&self) -> Result<Option<Address>, StatusHeartError> {
        self.from
            .as_deref()
            .map(|raw| {
                parse_chain_address(raw)
                    .map_err(|e| StatusHeartError::Config(format!("from: {e}")))
            })
            .transpose()
    }

    /// Gateway settings derived from this config.
    pub fn gateway_config(&self) -> Result<RpcGatewayConfig, StatusHeartError> {
        if self.rpc_url.trim().is_empty() {
            return Err(StatusHeartError::Config("rpc_url is empty".to_string()));
        }
        if self.receipt_poll_secs == 0 {
            return Err(StatusHeartError::Config(
                "receipt_poll_secs must be at least 1".to_string(),
            ));
        }
        Ok(RpcGatewayConfig {
            url: self.rpc_url.clone(),
            from: self.from_address()?,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
            receipt_poll: Duration::from_secs(self.receipt_poll_secs),
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, StatusHeartError> {
    raw.trim()
        .parse()
        .map_err(|_| StatusHeartError::Config(format!("{key}: expected seconds, got '{raw}'")))
}

// =============================================================================
// TESTS
// =============================================================================

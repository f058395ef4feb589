//! # CLI Command Implementations

use super::Cli;
use crate::api;
use crate::config::AgentConfig;
use crate::gateway::{JsonRpcGateway, TransactionGateway};
use crate::heartbeat::{self, HeartbeatService, REPORT_STATUS_INTERVAL, parse_contract_address};
use crate::identity_file::{self, IDENTITY_REFRESH_INTERVAL};
use statusheart_core::{
    AbiCallEncoder, CallEncoder, IdentityStore, STATUS_HEART_ADDRESS, SharedIdentity,
    StatusHeartError,
};
use std::sync::Arc;

// =============================================================================
// AGENT CONTEXT
// =============================================================================

/// Everything a command needs: resolved config, gateway and identity.
pub struct AgentContext {
    /// Resolved configuration.
    pub config: AgentConfig,
    /// Ledger gateway.
    pub gateway: Arc<JsonRpcGateway>,
    /// Identity store, loaded from the identity file if one is configured.
    pub identity: SharedIdentity,
}

impl AgentContext {
    /// Resolve config (file → env → flags), build the gateway and load the identity.
    pub fn load(cli: &Cli) -> Result<Self, StatusHeartError> {
        let mut config = AgentConfig::load(cli.config.as_deref())?;
        config.apply_env()?;
        if let Some(url) = &cli.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(path) = &cli.identity {
            config.identity_path = Some(path.clone());
        }

        let gateway = Arc::new(JsonRpcGateway::new(config.gateway_config()?)?);

        let identity = SharedIdentity::new();
        match &config.identity_path {
            Some(path) => {
                identity_file::refresh_identity(path, &identity);
            }
            None => tracing::warn!("No identity file configured; reports stay skipped"),
        }

        Ok(Self {
            config,
            gateway,
            identity,
        })
    }

    /// Heartbeat service over this context, not yet scheduled.
    fn service(&self) -> Result<HeartbeatService, StatusHeartError> {
        let contract = parse_contract_address(STATUS_HEART_ADDRESS)?;
        Ok(HeartbeatService::new(
            contract,
            self.gateway.clone(),
            Arc::new(self.identity.clone()),
            Arc::new(AbiCallEncoder),
        ))
    }
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Run the heartbeat until Ctrl+C.
pub async fn cmd_run(
    context: AgentContext,
    status_addr: Option<String>,
) -> Result<(), StatusHeartError> {
    let status_addr = status_addr.or_else(|| context.config.status_addr.clone());

    println!("Statusheart Agent Starting...");
    println!();
    println!("Configuration:");
    println!("  Contract: {}", STATUS_HEART_ADDRESS);
    println!("  Interval: {}s", REPORT_STATUS_INTERVAL.as_secs());
    println!("  RPC:      {}", context.gateway.url());
    match &context.config.identity_path {
        Some(path) => println!("  Identity: {}", path.display()),
        None => println!("  Identity: (none)"),
    }
    if let Some(addr) = &status_addr {
        println!("  Status:   http://{}/status", addr);
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let refresher = context.config.identity_path.clone().map(|path| {
        identity_file::spawn_refresh(path, context.identity.clone(), IDENTITY_REFRESH_INTERVAL)
    });

    let gateway: Arc<dyn TransactionGateway> = context.gateway.clone();
    let identity: Arc<dyn IdentityStore> = Arc::new(context.identity.clone());
    let encoder: Arc<dyn CallEncoder> = Arc::new(AbiCallEncoder);
    let handle = heartbeat::init(STATUS_HEART_ADDRESS, gateway, identity, encoder).await?;

    let api_task = status_addr.map(|addr| {
        let service = handle.service().clone();
        tokio::spawn(async move {
            if let Err(e) = api::run_server(&addr, service).await {
                tracing::error!(error = %e, "status API stopped");
            }
        })
    });

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| StatusHeartError::IoError(format!("Signal handler: {}", e)))?;
    tracing::info!("Shutdown requested");

    handle.shutdown().await;
    if let Some(task) = api_task {
        task.abort();
    }
    if let Some(task) = refresher {
        task.abort();
    }
    Ok(())
}

// =============================================================================
// REPORT COMMAND
// =============================================================================

/// Submit one heartbeat.
///
/// With `wait` the command blocks on the confirmation watcher the report
/// started. Without it the process exits and the watcher is abandoned.
pub async fn cmd_report(
    context: AgentContext,
    json_mode: bool,
    wait: bool,
) -> Result<(), StatusHeartError> {
    let service = context.service()?;

    let Some(report) = service.submit_report().await? else {
        if json_mode {
            println!("{}", serde_json::json!({ "skipped": true, "tx_hash": null }));
        } else {
            println!("Identity not established; nothing reported");
        }
        return Ok(());
    };
    let tx_hash = report.tx_hash;

    let receipt = if wait {
        let outcome = report
            .confirmation
            .await
            .map_err(|e| StatusHeartError::Confirmation(format!("watcher: {e}")))?;
        Some(outcome.ok_or_else(|| {
            StatusHeartError::Confirmation(format!("no receipt for {tx_hash}"))
        })?)
    } else {
        None
    };

    if json_mode {
        let output = serde_json::json!({
            "skipped": false,
            "tx_hash": tx_hash.to_string(),
            "receipt": receipt,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Reported: {}", tx_hash);
    if let Some(receipt) = receipt {
        let outcome = if receipt.success { "confirmed" } else { "reverted" };
        match receipt.block_number {
            Some(block) => println!("Receipt:  {} in block {}", outcome, block),
            None => println!("Receipt:  {}", outcome),
        }
    }
    Ok(())
}

// =============================================================================
// HASH-EXT COMMAND
// =============================================================================

/// Query `genHashExt` for the current identity.
pub async fn cmd_hash_ext(context: AgentContext, json_mode: bool) -> Result<(), StatusHeartError> {
    let service = context.service()?;
    let digest = service.gen_hash_ext().await?;

    if json_mode {
        println!("{}", serde_json::json!({ "digest": digest.to_string() }));
    } else {
        println!("genHashExt: {}", digest);
    }
    Ok(())
}

// =============================================================================
// IDENTITY COMMAND
// =============================================================================

/// Print the loaded identity.
pub fn cmd_identity(context: &AgentContext, json_mode: bool) -> Result<(), StatusHeartError> {
    let identity = context.identity.read();

    if json_mode {
        let text = serde_json::to_string_pretty(&identity)
            .map_err(|e| StatusHeartError::SerializationError(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    if !identity.is_established() {
        println!("Identity not established");
        return Ok(());
    }

    println!("Signed Identity");
    println!("===============");
    println!("Peer:          {}", identity.peer_id);
    println!("Created:       {}", identity.created_time);
    println!("Version:       {}", identity.version);
    println!("Nonce:         {}", identity.nonce);
    println!("Chain Address: {}", identity.chain_address);
    println!("Signed:        {}", identity.signed_time);
    println!("Signature:     {}", identity.signature);
    Ok(())
}

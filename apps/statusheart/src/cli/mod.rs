//! # Statusheart CLI Module
//!
//! ## Available Commands
//!
//! - `run` - Start the heartbeat agent (default)
//! - `report` - Submit one heartbeat and print the transaction hash
//! - `hash-ext` - Query the digest the contract expects to be signed
//! - `identity` - Show the loaded signed identity

mod commands;

use clap::{Parser, Subcommand};
use statusheart_core::StatusHeartError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Statusheart - node liveness reporter
///
/// Periodically reports the node's signed identity to the status heart
/// registry contract.
#[derive(Parser, Debug)]
#[command(name = "statusheart")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the TOML config file (default: ./statusheart.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON-RPC endpoint of the ledger node (overrides config and env)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Path to the signer's identity JSON (overrides config and env)
    #[arg(short, long, global = true)]
    pub identity: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the heartbeat agent
    Run {
        /// Serve the status API on this address (e.g. 127.0.0.1:9095)
        #[arg(long)]
        status_addr: Option<String>,
    },

    /// Submit one heartbeat now
    Report {
        /// Wait for the transaction receipt before exiting
        #[arg(short, long)]
        wait: bool,
    },

    /// Query the genHashExt digest for the current identity
    HashExt,

    /// Show the loaded signed identity
    Identity,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), StatusHeartError> {
    let context = AgentContext::load(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Run { status_addr }) => cmd_run(context, status_addr).await,
        Some(Commands::Report { wait }) => cmd_report(context, json_mode, wait).await,
        Some(Commands::HashExt) => cmd_hash_ext(context, json_mode).await,
        Some(Commands::Identity) => cmd_identity(&context, json_mode),
        None => cmd_run(context, None).await,
    }
}

//! # Statusheart - node liveness reporter
//!
//! Reports the node's signed identity to the status heart registry contract
//! every ten seconds.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 apps/statusheart (THE BINARY)                │
//! │                                                              │
//! │  ┌──────────┐   ┌──────────────────┐   ┌─────────────────┐   │
//! │  │   CLI    │──►│ HeartbeatService │──►│ JsonRpcGateway  │──►│ ledger node
//! │  │  (clap)  │   │   + scheduler    │   │   (reqwest)     │   │
//! │  └──────────┘   └────────┬─────────┘   └─────────────────┘   │
//! │                          │                                   │
//! │  ┌──────────┐            ▼                                   │
//! │  │Status API│   ┌──────────────────┐                         │
//! │  │  (axum)  │   │ statusheart-core │                         │
//! │  └──────────┘   │  (THE LOGIC)     │                         │
//! │                 └──────────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Run the agent with the status API enabled
//! statusheart --identity identity.json run --status-addr 127.0.0.1:9095
//!
//! # One-shot report, waiting for the receipt
//! statusheart --identity identity.json report --wait
//! ```

use clap::Parser;
use statusheart::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing. STATUSHEART_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("STATUSHEART_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "statusheart=info,tower_http=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  statusheart v{}
  node liveness reporter
"#,
        env!("CARGO_PKG_VERSION")
    );
}

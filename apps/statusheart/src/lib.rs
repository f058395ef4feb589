//! # statusheart
//!
//! The status heart agent - THE BINARY's library half.
//!
//! - `heartbeat` - reporter, confirmation watcher and perpetual scheduler
//! - `gateway` - transaction gateway trait and the JSON-RPC implementation
//! - `config` - TOML/env configuration
//! - `identity_file` - loads the signer's identity JSON into the shared store
//! - `api` - read-only status HTTP API
//! - `cli` - clap commands

pub mod api;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod heartbeat;
pub mod identity_file;

//! The `twin-bridge` command line tool: relay inspection and retry for
//! Solana to Base messages, quoting, and bridged action execution.

#![deny(clippy::nursery, clippy::pedantic, warnings, unused_crate_dependencies)]

// Used by the `twin-bridge` binary.
use tokio as _;

pub mod cli;
pub mod commands;
pub mod observability;

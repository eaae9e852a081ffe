//! Orchestrates bridged in-game actions from Solana to Base.
//!
//! A [`BridgeOrchestrator`] quotes the SOL needed for an action, builds a
//! `bridge_sol` instruction carrying an `ITwin.execute` call, has the wallet
//! sign it, submits it and waits for finality.

#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod chain;
pub mod config;
pub mod instruction;
pub mod orchestrator;
pub mod signer;

pub use chain::{RpcSourceChain, SourceChain, TxOutcome};
pub use config::{ActionConfig, OrchestratorConfig, ProgramIds, SolanaConfig};
pub use orchestrator::{
    AttemptTicket, BridgeOrchestrator, BridgeTransactionState, OrchestratorError, StateKind,
    TransactionSkeleton,
};
pub use signer::{KeypairSigner, WalletSigner};

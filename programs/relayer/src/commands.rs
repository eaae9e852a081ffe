//! Subcommand handlers. Each returns the JSON value printed to stdout.

use std::path::Path;
use std::str::FromStr;

use alloy::primitives::U256;
use anyhow::Context;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use twin_bridge_quote::Quoter;
use twin_bridge_relayer_core::{config::RelayerConfig, context::RelayerContext};
use twin_bridge_relayer_lib::{codec, report::MessageReport, retry::DEFAULT_GAS_LIMIT};
use twin_bridge_solana_to_base::{BridgeTransactionState, KeypairSigner};

use crate::cli::{action, decode, inspect, quote, retry};

fn parse_pubkey(s: &str) -> anyhow::Result<Pubkey> {
    Pubkey::from_str(s).with_context(|| format!("invalid pubkey {s}"))
}

/// Parses hex account data, with or without a `0x` prefix.
///
/// # Errors
/// Fails if `s` is not valid hex.
pub fn parse_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).context("account data is not valid hex")
}

/// Decodes and hashes raw account data.
///
/// # Errors
/// Fails if the data does not decode.
pub fn decode_report(
    data: &[u8],
    pubkey: &Pubkey,
    gas_limit: u64,
) -> anyhow::Result<MessageReport> {
    let message = codec::decode(data)?;
    Ok(MessageReport::new(pubkey.as_ref(), message, gas_limit)?)
}

/// `decode` subcommand.
///
/// # Errors
/// Fails if the input cannot be read or decoded.
pub fn run_decode(args: &decode::Args) -> anyhow::Result<Value> {
    let data = match (&args.hex, &args.file) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(file)) => {
            std::fs::read(file).with_context(|| format!("failed to read {file}"))?
        }
        (None, None) => anyhow::bail!("either --hex or --file is required"),
    };
    let pubkey = parse_pubkey(&args.pubkey)?;

    let report = decode_report(&data, &pubkey, args.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT))?;
    Ok(serde_json::to_value(report)?)
}

/// `inspect` subcommand.
///
/// # Errors
/// Fails if the message cannot be loaded or its status read.
pub async fn run_inspect(args: &inspect::Args, config: RelayerConfig) -> anyhow::Result<Value> {
    let pubkey = parse_pubkey(&args.pubkey)?;
    let ctx = RelayerContext::new(config)?;

    let report = ctx.inspect(&pubkey, !args.no_status).await?;
    Ok(serde_json::to_value(report)?)
}

/// `retry` subcommand.
///
/// # Errors
/// Fails if the message cannot be loaded, its status read, or the status does
/// not allow a retry without `--force`.
pub async fn run_retry(args: &retry::Args, config: RelayerConfig) -> anyhow::Result<Value> {
    let pubkey = parse_pubkey(&args.pubkey)?;
    let ctx = RelayerContext::new(config)?;

    // A forced retry does not need the status, but reports it when readable.
    let report = match ctx.inspect(&pubkey, true).await {
        Ok(report) => report,
        Err(e) if args.force => {
            tracing::warn!(error = %format!("{e:#}"), "status unavailable, forcing retry");
            ctx.inspect(&pubkey, false).await?
        }
        Err(e) => return Err(e),
    };

    let retry = ctx.retry(&report, args.gas_limit, args.force)?;
    tracing::info!(
        outer_hash = %report.hashes.outer_hash,
        gas_limit = retry.effective_gas_limit,
        "retry calldata built"
    );
    Ok(json!({
        "message": report,
        "retry": retry,
    }))
}

/// `quote` subcommand.
///
/// # Errors
/// Fails if the price does not parse. A failed quote is reported in the
/// output, not as an error.
pub async fn run_quote(args: &quote::Args, config: RelayerConfig) -> anyhow::Result<Value> {
    let price = U256::from_str(args.price.trim())
        .map_err(|e| anyhow::anyhow!("invalid price {}: {e}", args.price))?;
    let ctx = RelayerContext::new(config)?;

    let quote = ctx.quote_engine().quote(price, args.slippage_bps).await;
    if let Some(error) = &quote.error {
        tracing::warn!(%error, retryable = error.is_retryable(), "quote failed");
    }
    Ok(serde_json::to_value(quote)?)
}

/// `action` subcommand.
///
/// # Errors
/// Fails if the keypair or action cannot be loaded, or the action ends in
/// `Error`.
pub async fn run_action(args: &action::Args, config: RelayerConfig) -> anyhow::Result<Value> {
    let wallet = KeypairSigner::from_file(Path::new(&args.keypair))?;
    let ctx = RelayerContext::new(config)?;
    let mut orchestrator = ctx.orchestrator(&args.name, wallet)?;

    let state = orchestrator.run().await.clone();
    match state {
        BridgeTransactionState::Success { signature } => Ok(json!({
            "action": args.name,
            "signature": signature.to_string(),
            "transitions": transitions(orchestrator.transitions()),
        })),
        BridgeTransactionState::Error { error } => {
            tracing::error!(
                transitions = ?orchestrator.transitions(),
                "action {} failed",
                args.name
            );
            Err(error.into())
        }
        state => anyhow::bail!("action stopped in {}", state.kind()),
    }
}

fn transitions(kinds: &[twin_bridge_solana_to_base::StateKind]) -> Vec<String> {
    kinds.iter().map(ToString::to_string).collect()
}

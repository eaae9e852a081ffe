//! Defines the [`RelayerContext`] that connects configured components to
//! their chains.

use std::sync::Arc;

use alloy::{
    network::Ethereum, primitives::Address, providers::RootProvider,
    transports::http::reqwest::Url,
};
use anyhow::Context;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use twin_bridge_quote::OnChainQuoteEngine;
use twin_bridge_relayer_lib::{
    account::{fetch_outgoing_message, RpcAccountReader},
    report::MessageReport,
    retry::{build_retry, RetryCalldata},
    status::{BridgeStatusChecker, EvmStatusBackend},
};
use twin_bridge_solana_to_base::{
    BridgeOrchestrator, ProgramIds, RpcSourceChain, WalletSigner,
};

use crate::config::RelayerConfig;

/// Orchestrator wired to the configured chains.
pub type LiveOrchestrator<W> = BridgeOrchestrator<RpcSourceChain, OnChainQuoteEngine, W>;

/// Connected clients for both chains plus the parsed configuration.
pub struct RelayerContext {
    config: RelayerConfig,
    programs: ProgramIds,
    solana: Arc<RpcClient>,
    base: RootProvider,
}

impl RelayerContext {
    /// Creates the chain clients for `config`. No request is sent yet.
    ///
    /// # Errors
    /// Fails if an RPC URL or program ID is invalid.
    pub fn new(config: RelayerConfig) -> anyhow::Result<Self> {
        let programs = config.solana.program_ids()?;
        let base_url: Url = config
            .base
            .rpc_url
            .parse()
            .with_context(|| format!("invalid base.rpc_url {}", config.base.rpc_url))?;

        let solana = Arc::new(RpcClient::new(config.solana.rpc_url.clone()));
        let base = RootProvider::<Ethereum>::new_http(base_url);

        tracing::debug!(
            solana_rpc = %config.solana.rpc_url,
            base_rpc = %config.base.rpc_url,
            bridge_program = %programs.bridge_program,
            "relayer context created"
        );

        Ok(Self {
            config,
            programs,
            solana,
            base,
        })
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &RelayerConfig {
        &self.config
    }

    /// The `Bridge` contract retries are sent to.
    #[must_use]
    pub const fn bridge_address(&self) -> Address {
        self.config.base.bridge_address
    }

    /// Reads outgoing message accounts from Solana.
    #[must_use]
    pub fn account_reader(&self) -> RpcAccountReader {
        RpcAccountReader::new(Arc::clone(&self.solana))
    }

    /// Reads message status from the Base contracts.
    #[must_use]
    pub fn status_checker(&self) -> BridgeStatusChecker<EvmStatusBackend> {
        BridgeStatusChecker::new(EvmStatusBackend::new(
            self.base.clone(),
            self.config.base.bridge_address,
            self.config.base.validator_address,
        ))
    }

    /// Quotes against the configured pools on Base.
    #[must_use]
    pub fn quote_engine(&self) -> OnChainQuoteEngine {
        OnChainQuoteEngine::from_config(&self.base, &self.config.quote)
    }

    /// Creates an orchestrator for the action named `action`, signing with
    /// `wallet`.
    ///
    /// # Errors
    /// Fails if no action has that name.
    pub fn orchestrator<W: WalletSigner>(
        &self,
        action: &str,
        wallet: W,
    ) -> anyhow::Result<LiveOrchestrator<W>> {
        let action = self.config.action(action)?.clone();

        Ok(BridgeOrchestrator::new(
            action,
            self.config.orchestrator.clone(),
            self.programs,
            RpcSourceChain::new(Arc::clone(&self.solana)),
            self.quote_engine(),
        )
        .with_wallet(wallet))
    }

    /// Loads, decodes and hashes the outgoing message at `pubkey`, attaching
    /// its status on Base when `with_status` is set.
    ///
    /// # Errors
    /// Fails if the account cannot be read or decoded, or a status read fails.
    #[tracing::instrument(skip_all, fields(%pubkey, with_status))]
    pub async fn inspect(
        &self,
        pubkey: &Pubkey,
        with_status: bool,
    ) -> anyhow::Result<MessageReport> {
        let message = fetch_outgoing_message(&self.account_reader(), pubkey).await?;
        let report = MessageReport::new(
            pubkey.as_ref(),
            message,
            self.config.relay.default_gas_limit,
        )?;

        if !with_status {
            return Ok(report);
        }

        let status = self
            .status_checker()
            .status(report.hashes.outer_hash)
            .await?;
        Ok(report.with_status(status))
    }

    /// Builds retry calldata for `report`'s message.
    ///
    /// Unless `force` is set, refuses messages that are not relayable: not yet
    /// validated, or already executed successfully.
    ///
    /// # Errors
    /// Fails if the status is unknown or does not allow a retry.
    pub fn retry(
        &self,
        report: &MessageReport,
        gas_limit: Option<u64>,
        force: bool,
    ) -> anyhow::Result<RetryCalldata> {
        if !force {
            let status = report
                .status
                .context("message status is required unless forced")?;
            anyhow::ensure!(
                status.is_relayable(),
                "message {} is not relayable ({:?}); use --force to override",
                report.hashes.outer_hash,
                status.phase()
            );
        }

        Ok(build_retry(
            self.bridge_address(),
            &report.canonical,
            gas_limit,
            &self.config.gas_limits(),
        ))
    }
}

//! Access to the Solana ledger the orchestrator submits to.

use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

/// Final outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// Finalized without error.
    Finalized,
    /// Landed but the program returned an error.
    Failed(String),
}

/// Source chain operations used by the orchestrator.
#[async_trait]
pub trait SourceChain: Send + Sync {
    /// Lamport balance of `owner`.
    async fn balance(&self, owner: &Pubkey) -> anyhow::Result<u64>;

    /// Whether an account exists at `pubkey`.
    async fn account_exists(&self, pubkey: &Pubkey) -> anyhow::Result<bool>;

    /// Blockhash to sign a new transaction against.
    async fn latest_blockhash(&self) -> anyhow::Result<Hash>;

    /// Sends a signed transaction. An error means the node rejected it.
    async fn submit(&self, tx: &Transaction) -> anyhow::Result<Signature>;

    /// Outcome of a submitted transaction, or `None` while it is not final.
    async fn confirmation(&self, signature: &Signature) -> anyhow::Result<Option<TxOutcome>>;
}

/// [`SourceChain`] backed by a Solana JSON-RPC node.
pub struct RpcSourceChain {
    client: Arc<RpcClient>,
}

impl RpcSourceChain {
    /// Create a new [`RpcSourceChain`] instance.
    #[must_use]
    pub const fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceChain for RpcSourceChain {
    async fn balance(&self, owner: &Pubkey) -> anyhow::Result<u64> {
        Ok(self
            .client
            .get_balance_with_commitment(owner, CommitmentConfig::confirmed())
            .await?
            .value)
    }

    async fn account_exists(&self, pubkey: &Pubkey) -> anyhow::Result<bool> {
        Ok(self
            .client
            .get_account_with_commitment(pubkey, CommitmentConfig::confirmed())
            .await?
            .value
            .is_some())
    }

    async fn latest_blockhash(&self) -> anyhow::Result<Hash> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn submit(&self, tx: &Transaction) -> anyhow::Result<Signature> {
        Ok(self.client.send_transaction(tx).await?)
    }

    async fn confirmation(&self, signature: &Signature) -> anyhow::Result<Option<TxOutcome>> {
        let status = self
            .client
            .get_signature_status_with_commitment(signature, CommitmentConfig::finalized())
            .await?;

        Ok(status.map(|result| match result {
            Ok(()) => TxOutcome::Finalized,
            Err(e) => TxOutcome::Failed(e.to_string()),
        }))
    }
}

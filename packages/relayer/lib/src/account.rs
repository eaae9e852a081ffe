//! Reading outgoing message accounts from Solana.

use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use thiserror::Error;

use crate::codec::{self, CodecError, OutgoingMessage};

/// Errors that can occur while loading an outgoing message.
#[derive(Debug, Error)]
pub enum AccountError {
    /// No account exists at the address.
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    /// The RPC request failed.
    #[error("failed to fetch account {pubkey}: {reason}")]
    Fetch {
        /// Requested account.
        pubkey: Pubkey,
        /// Rendered RPC error.
        reason: String,
    },

    /// The account exists but does not decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Source of raw account data.
#[async_trait]
pub trait AccountReader: Send + Sync {
    /// Returns the account data, or `None` if the account does not exist.
    async fn fetch_account(&self, pubkey: &Pubkey) -> anyhow::Result<Option<Vec<u8>>>;
}

/// [`AccountReader`] backed by a Solana JSON-RPC node.
pub struct RpcAccountReader {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcAccountReader {
    /// Reads at `confirmed` commitment.
    #[must_use]
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            client,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

#[async_trait]
impl AccountReader for RpcAccountReader {
    async fn fetch_account(&self, pubkey: &Pubkey) -> anyhow::Result<Option<Vec<u8>>> {
        let account = self
            .client
            .get_account_with_commitment(pubkey, self.commitment)
            .await?
            .value;
        Ok(account.map(|a| a.data))
    }
}

/// Fetches and decodes the outgoing message stored at `pubkey`.
///
/// # Errors
/// Fails if the account is missing, the read fails, or the data does not
/// decode.
#[tracing::instrument(skip_all, fields(%pubkey))]
pub async fn fetch_outgoing_message<R: AccountReader + ?Sized>(
    reader: &R,
    pubkey: &Pubkey,
) -> Result<OutgoingMessage, AccountError> {
    let data = reader
        .fetch_account(pubkey)
        .await
        .map_err(|e| AccountError::Fetch {
            pubkey: *pubkey,
            reason: format!("{e:#}"),
        })?
        .ok_or(AccountError::AccountNotFound(*pubkey))?;

    tracing::debug!(len = data.len(), "fetched outgoing message account");
    Ok(codec::decode(&data)?)
}

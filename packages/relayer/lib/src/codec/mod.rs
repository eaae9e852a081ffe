//! Decoder for `OutgoingMessage` accounts written by the Solana bridge program.
//!
//! Account layout (all integers little-endian):
//!
//! ```text
//! [0..8]    anchor discriminator
//! [8..16]   nonce             u64
//! [16..48]  sender            [u8; 32]
//! [48]      variant tag       0 = Call, 1 = Transfer
//! [49..]    variant body
//!
//! Call:     ty u8 | to [u8; 20] | value u128 | len u32 | data [u8; len]
//! Transfer: to [u8; 20] | local_token [u8; 32] | remote_token [u8; 20]
//!           | amount u64 | has_call u8 | Call (if has_call == 1)
//! ```
//!
//! Trailing bytes after the message are ignored: accounts are allocated with
//! headroom and the program does not shrink them.

mod reader;

pub use reader::{read_u128_le, read_u32_le, read_u64_le, ByteCursor};

use alloy::primitives::{Address, Bytes, B256};
use thiserror::Error;

/// Size of the anchor account discriminator.
pub const ACCOUNT_DISCRIMINATOR_SIZE: usize = 8;

/// Discriminator, nonce, sender and variant tag.
pub const MIN_ACCOUNT_SIZE: usize = ACCOUNT_DISCRIMINATOR_SIZE + 8 + 32 + 1;

const TAG_CALL: u8 = 0;
const TAG_TRANSFER: u8 = 1;

/// Errors that can occur while decoding an outgoing message account.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The account ended before a field could be read.
    #[error(
        "malformed account: `{field}` at offset {offset} needs {needed} bytes, {available} available"
    )]
    MalformedAccount {
        /// Field being read.
        field: &'static str,
        /// Offset of the field.
        offset: usize,
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left from `offset`.
        available: usize,
    },

    /// The payload tag is neither call nor transfer.
    #[error("unknown message variant tag {tag}")]
    UnknownVariant {
        /// Tag byte found.
        tag: u8,
    },

    /// An `Option` tag other than 0 or 1.
    #[error("invalid option tag {tag} at offset {offset}")]
    InvalidOptionTag {
        /// Offset of the tag.
        offset: usize,
        /// Tag byte found.
        tag: u8,
    },
}

/// Cross-chain intent recorded on Solana.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OutgoingMessage {
    /// Per-sender nonce assigned by the Solana program.
    pub nonce: u64,
    /// Solana pubkey of the sender.
    pub sender: B256,
    /// What the message does on Base.
    pub payload: Payload,
}

/// Body of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// A call on Base.
    Call(CallPayload),
    /// A transfer to Base, optionally with a call.
    Transfer(TransferPayload),
}

/// A call to execute on Base.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CallPayload {
    /// `Call.ty`, e.g. `CALL` or `DELEGATECALL`.
    pub call_type: u8,
    /// Contract called on Base.
    pub target: Address,
    /// Wei sent with the call.
    pub value: u128,
    /// Calldata.
    pub data: Bytes,
}

/// A token transfer to Base, optionally followed by a call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TransferPayload {
    /// Recipient on Base. Right-padded to 32 bytes when hashed.
    pub recipient: Address,
    /// Solana mint of the bridged token.
    pub local_token: B256,
    /// ERC20 address of the token on Base.
    pub remote_token: Address,
    /// Amount in the mint's smallest unit.
    pub amount: u64,
    /// Call executed after the transfer, if any.
    pub call: Option<CallPayload>,
}

impl OutgoingMessage {
    /// Whether the payload carries a call, either bare or attached to a transfer.
    #[must_use]
    pub const fn has_call(&self) -> bool {
        match &self.payload {
            Payload::Call(_) => true,
            Payload::Transfer(transfer) => transfer.call.is_some(),
        }
    }
}

/// Decodes an `OutgoingMessage` account buffer.
///
/// # Errors
/// - [`CodecError::MalformedAccount`] if the buffer is shorter than
///   [`MIN_ACCOUNT_SIZE`] or any field runs past the end of the buffer.
/// - [`CodecError::UnknownVariant`] if the variant tag is not 0 or 1.
/// - [`CodecError::InvalidOptionTag`] if the attached-call flag is not 0 or 1.
pub fn decode(buffer: &[u8]) -> Result<OutgoingMessage, CodecError> {
    if buffer.len() < MIN_ACCOUNT_SIZE {
        return Err(CodecError::MalformedAccount {
            field: "header",
            offset: 0,
            needed: MIN_ACCOUNT_SIZE,
            available: buffer.len(),
        });
    }

    let mut cursor = ByteCursor::new(buffer);
    cursor.skip(ACCOUNT_DISCRIMINATOR_SIZE, "discriminator")?;
    let nonce = cursor.u64_le("nonce")?;
    let sender = B256::from(cursor.array::<32>("sender")?);

    let payload = match cursor.u8("variant")? {
        TAG_CALL => Payload::Call(decode_call(&mut cursor)?),
        TAG_TRANSFER => Payload::Transfer(decode_transfer(&mut cursor)?),
        tag => return Err(CodecError::UnknownVariant { tag }),
    };

    tracing::debug!(
        nonce,
        %sender,
        trailing = cursor.remaining(),
        "decoded outgoing message"
    );

    Ok(OutgoingMessage {
        nonce,
        sender,
        payload,
    })
}

fn decode_call(cursor: &mut ByteCursor<'_>) -> Result<CallPayload, CodecError> {
    let call_type = cursor.u8("call.ty")?;
    let target = Address::from(cursor.array::<20>("call.to")?);
    let value = cursor.u128_le("call.value")?;
    let len = cursor.u32_le("call.data.len")? as usize;
    let data = Bytes::copy_from_slice(cursor.take(len, "call.data")?);

    Ok(CallPayload {
        call_type,
        target,
        value,
        data,
    })
}

fn decode_transfer(cursor: &mut ByteCursor<'_>) -> Result<TransferPayload, CodecError> {
    let recipient = Address::from(cursor.array::<20>("transfer.to")?);
    let local_token = B256::from(cursor.array::<32>("transfer.local_token")?);
    let remote_token = Address::from(cursor.array::<20>("transfer.remote_token")?);
    let amount = cursor.u64_le("transfer.amount")?;

    let flag_offset = cursor.offset();
    let call = match cursor.u8("transfer.has_call")? {
        0 => None,
        1 => Some(decode_call(cursor)?),
        tag => {
            return Err(CodecError::InvalidOptionTag {
                offset: flag_offset,
                tag,
            })
        }
    };

    Ok(TransferPayload {
        recipient,
        local_token,
        remote_token,
        amount,
        call,
    })
}

#[cfg(test)]
pub(crate) mod test_utils {
    //! Hand-laid account buffers.

    pub const DISCRIMINATOR: [u8; 8] = [0x2a, 0x11, 0x5e, 0x90, 0x03, 0x7c, 0xd4, 0x61];

    pub fn header(nonce: u64, sender: [u8; 32], tag: u8) -> Vec<u8> {
        let mut buf = DISCRIMINATOR.to_vec();
        buf.extend_from_slice(&nonce.to_le_bytes());
        buf.extend_from_slice(&sender);
        buf.push(tag);
        buf
    }

    pub fn call_body(ty: u8, to: [u8; 20], value: u128, data: &[u8]) -> Vec<u8> {
        let mut buf = vec![ty];
        buf.extend_from_slice(&to);
        buf.extend_from_slice(&value.to_le_bytes());
        buf.extend_from_slice(&u32::try_from(data.len()).unwrap().to_le_bytes());
        buf.extend_from_slice(data);
        buf
    }

    pub fn transfer_body(
        to: [u8; 20],
        local_token: [u8; 32],
        remote_token: [u8; 20],
        amount: u64,
        call: Option<Vec<u8>>,
    ) -> Vec<u8> {
        let mut buf = to.to_vec();
        buf.extend_from_slice(&local_token);
        buf.extend_from_slice(&remote_token);
        buf.extend_from_slice(&amount.to_le_bytes());
        match call {
            None => buf.push(0),
            Some(body) => {
                buf.push(1);
                buf.extend_from_slice(&body);
            }
        }
        buf
    }

    pub fn transfer_account(amount: u64, call: Option<Vec<u8>>) -> Vec<u8> {
        let mut buf = header(7, [0x11; 32], 1);
        buf.extend(transfer_body([0x22; 20], [0x33; 32], [0x44; 20], amount, call));
        buf
    }

    pub fn call_account(data: &[u8]) -> Vec<u8> {
        let mut buf = header(3, [0x11; 32], 0);
        buf.extend(call_body(0, [0x55; 20], 5, data));
        buf
    }
}

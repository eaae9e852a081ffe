//! Message types verified by the Base `Bridge` contract.
//!
//! The field order and widths of these structs are part of the hashing
//! contract with the destination chain: `Bridge` recomputes
//! `keccak256(abi.encode(nonce, outgoingMessagePubkey, innerHash))` over
//! exactly these shapes.

alloy_sol_types::sol! {
    /// Token transfer from Solana, as decoded by `Bridge`.
    ///
    /// `localToken` is the ERC20 on Base, `remoteToken` the Solana mint,
    /// `to` the recipient right-padded to 32 bytes.
    #[derive(Debug, PartialEq, Eq)]
    struct Transfer {
        address localToken;
        bytes32 remoteToken;
        bytes32 to;
        uint64 remoteAmount;
    }

    /// Arbitrary call executed by `Bridge` on Base.
    #[derive(Debug, PartialEq, Eq)]
    struct Call {
        uint8 ty;
        address to;
        uint128 value;
        bytes data;
    }

    /// Message relayed from Solana to Base.
    #[derive(Debug, PartialEq, Eq)]
    struct IncomingMessage {
        bytes32 outgoingMessagePubkey;
        uint64 nonce;
        bytes32 sender;
        uint64 gasLimit;
        uint8 ty;
        bytes data;
    }

    /// Batched relay entry point of `Bridge`.
    #[derive(Debug, PartialEq, Eq)]
    interface IBridgeRelay {
        function relayMessages(IncomingMessage[] calldata messages) external;
    }
}

/// `IncomingMessage.ty` for a bare call.
pub const MESSAGE_TYPE_CALL: u8 = 0;
/// `IncomingMessage.ty` for a transfer without an attached call.
pub const MESSAGE_TYPE_TRANSFER: u8 = 1;
/// `IncomingMessage.ty` for a transfer followed by a call.
pub const MESSAGE_TYPE_TRANSFER_AND_CALL: u8 = 2;

//! Calldata for manually re-relaying a message on Base.
//!
//! Pure construction. The caller gates on [`BridgeStatus::is_relayable`]
//! beforehand; nothing here touches the network.
//!
//! [`BridgeStatus::is_relayable`]: crate::status::BridgeStatus::is_relayable

use alloy::{
    primitives::{Address, Bytes},
    sol_types::SolCall,
};
use twin_bridge_solidity_types::msgs::{IBridgeRelay, IncomingMessage};

use crate::canonical::CanonicalEvmMessage;

/// Execution gas used when the operator does not pick one.
pub const DEFAULT_GAS_LIMIT: u64 = 500_000;
/// Upper bound on execution gas for a single relayed message.
pub const MAX_GAS_LIMIT: u64 = 2_000_000;
/// Dispatch cost of `relayMessages` on top of the inner call.
pub const RELAY_OVERHEAD_GAS: u64 = 200_000;

/// Gas bounds applied to a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLimits {
    /// Used when no gas limit is requested.
    pub default_gas_limit: u64,
    /// Requests above this are clamped down.
    pub max_gas_limit: u64,
    /// Added to the execution gas to get the transaction gas.
    pub relay_overhead_gas: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            default_gas_limit: DEFAULT_GAS_LIMIT,
            max_gas_limit: MAX_GAS_LIMIT,
            relay_overhead_gas: RELAY_OVERHEAD_GAS,
        }
    }
}

impl GasLimits {
    /// Resolves the requested gas limit into `[1, max_gas_limit]`.
    #[must_use]
    pub fn clamp(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_gas_limit)
            .clamp(1, self.max_gas_limit.max(1))
    }
}

/// Ready-to-send retry transaction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RetryCalldata {
    /// `Bridge` contract to send the transaction to.
    pub bridge: Address,
    /// `relayMessages([message])` calldata.
    pub calldata: Bytes,
    /// Execution gas written into the message.
    pub effective_gas_limit: u64,
    /// Gas limit for the outer transaction.
    pub suggested_outer_gas: u64,
    /// Shell command an operator can paste.
    pub hint: String,
}

/// Builds the retry transaction for `message`.
///
/// The requested gas limit is clamped with [`GasLimits::clamp`]. Repeated
/// calls with the same inputs produce identical calldata.
#[must_use]
pub fn build_retry(
    bridge: Address,
    message: &CanonicalEvmMessage,
    requested_gas_limit: Option<u64>,
    limits: &GasLimits,
) -> RetryCalldata {
    let effective_gas_limit = limits.clamp(requested_gas_limit);
    if requested_gas_limit.is_some_and(|g| g != effective_gas_limit) {
        tracing::warn!(
            requested = requested_gas_limit,
            effective = effective_gas_limit,
            "gas limit clamped"
        );
    }

    let incoming = IncomingMessage::from(&message.with_gas_limit(effective_gas_limit));
    let calldata: Bytes = IBridgeRelay::relayMessagesCall {
        messages: vec![incoming],
    }
    .abi_encode()
    .into();

    let suggested_outer_gas = effective_gas_limit.saturating_add(limits.relay_overhead_gas);
    let hint = format!("cast send {bridge} {calldata} --gas-limit {suggested_outer_gas}");

    RetryCalldata {
        bridge,
        calldata,
        effective_gas_limit,
        suggested_outer_gas,
        hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::build;
    use crate::codec::{decode, test_utils::transfer_account};
    use rstest::rstest;

    const BRIDGE: Address = Address::repeat_byte(0xbb);

    fn message() -> CanonicalEvmMessage {
        let msg = decode(&transfer_account(1_000_000, None)).unwrap();
        build(&[0x99; 32], &msg, 0).unwrap()
    }

    #[rstest]
    #[case::zero(Some(0), 1)]
    #[case::above_max(Some(10_000_000), 2_000_000)]
    #[case::in_range(Some(750_000), 750_000)]
    #[case::at_max(Some(2_000_000), 2_000_000)]
    #[case::default(None, 500_000)]
    fn clamps_gas_limit(#[case] requested: Option<u64>, #[case] effective: u64) {
        let retry = build_retry(BRIDGE, &message(), requested, &GasLimits::default());

        assert_eq!(retry.effective_gas_limit, effective);
        assert_eq!(retry.suggested_outer_gas, effective + RELAY_OVERHEAD_GAS);
    }

    #[test]
    fn calldata_relays_the_message_with_effective_gas() {
        let msg = message();
        let retry = build_retry(BRIDGE, &msg, Some(750_000), &GasLimits::default());

        assert_eq!(
            &retry.calldata[..4],
            IBridgeRelay::relayMessagesCall::SELECTOR.as_slice()
        );
        let decoded = IBridgeRelay::relayMessagesCall::abi_decode(&retry.calldata).unwrap();
        assert_eq!(decoded.messages.len(), 1);
        assert_eq!(decoded.messages[0].gasLimit, 750_000);
        assert_eq!(decoded.messages[0].data, msg.data);
        assert_eq!(decoded.messages[0].nonce, msg.nonce);
    }

    #[test]
    fn retry_is_idempotent() {
        let msg = message();
        let a = build_retry(BRIDGE, &msg, Some(300_000), &GasLimits::default());
        let b = build_retry(BRIDGE, &msg, Some(300_000), &GasLimits::default());

        assert_eq!(a, b);
    }

    #[test]
    fn gas_limit_does_not_change_hashes() {
        let msg = message();
        assert_eq!(msg.hashes(), msg.with_gas_limit(1_234).hashes());
    }

    #[test]
    fn hint_targets_bridge() {
        let retry = build_retry(BRIDGE, &message(), None, &GasLimits::default());

        assert!(retry.hint.starts_with(&format!("cast send {BRIDGE} 0x")));
        assert!(retry.hint.ends_with("--gas-limit 700000"));
    }

    #[test]
    fn custom_limits_are_respected() {
        let limits = GasLimits {
            default_gas_limit: 100,
            max_gas_limit: 1_000,
            relay_overhead_gas: 50,
        };
        assert_eq!(limits.clamp(None), 100);
        assert_eq!(limits.clamp(Some(5_000)), 1_000);

        let retry = build_retry(BRIDGE, &message(), None, &limits);
        assert_eq!(retry.suggested_outer_gas, 150);
    }
}

//! Configuration of the Solana side and of bridged actions.

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};
use anyhow::Context;
use solana_sdk::pubkey::Pubkey;
use twin_bridge_relayer_lib::{retry::DEFAULT_GAS_LIMIT, utils::serde::number_as_string};

/// Connection to Solana and the programs the orchestrator calls.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct SolanaConfig {
    /// The Solana RPC URL.
    pub rpc_url: String,
    /// The Base bridge program ID on Solana.
    pub bridge_program_id: String,
    /// The game program ID, owner of player accounts.
    pub game_program_id: String,
    /// Account that receives the bridge gas fee.
    pub gas_fee_receiver: String,
}

/// [`SolanaConfig`] program IDs, parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramIds {
    /// The Base bridge program.
    pub bridge_program: Pubkey,
    /// The game program.
    pub game_program: Pubkey,
    /// Receiver of the bridge gas fee.
    pub gas_fee_receiver: Pubkey,
}

impl SolanaConfig {
    /// Parses the configured program IDs.
    ///
    /// # Errors
    /// Fails if any ID is not a valid base58 pubkey.
    pub fn program_ids(&self) -> anyhow::Result<ProgramIds> {
        Ok(ProgramIds {
            bridge_program: Pubkey::from_str(&self.bridge_program_id)
                .context("invalid bridge_program_id")?,
            game_program: Pubkey::from_str(&self.game_program_id)
                .context("invalid game_program_id")?,
            gas_fee_receiver: Pubkey::from_str(&self.gas_fee_receiver)
                .context("invalid gas_fee_receiver")?,
        })
    }
}

/// Configuration for the bridge transaction orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Twin adapter on Base that executes bridged actions.
    pub twin_address: Address,
    /// ERC20 address of bridged SOL on Base.
    pub remote_sol_token: Address,
    /// How long to wait for finality before giving up.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
    /// Delay between signature status polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Lamports charged by the bridge on top of the bridged amount.
    #[serde(default)]
    pub bridge_fee_lamports: u64,
    /// How long a quote may be reused across attempts.
    #[serde(default = "default_quote_ttl_ms")]
    pub quote_ttl_ms: u64,
    /// Execution gas requested for the call on Base.
    #[serde(default = "default_destination_gas_limit")]
    pub destination_gas_limit: u64,
}

const fn default_confirmation_timeout_ms() -> u64 {
    60_000
}

const fn default_poll_interval_ms() -> u64 {
    1_000
}

const fn default_quote_ttl_ms() -> u64 {
    30_000
}

const fn default_destination_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

/// A bridged in-game action.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    /// Name the action is selected by.
    pub name: String,
    /// Identifier passed to `ITwin.execute`.
    pub action_id: B256,
    /// Cost of the action in the priced token on Base. Zero for free actions.
    #[serde(with = "number_as_string")]
    pub price: U256,
    /// Whether the player account must exist before the action can run.
    #[serde(default)]
    pub requires_setup: bool,
    /// Opaque action arguments forwarded to the adapter.
    #[serde(default)]
    pub action_data: Bytes,
}

impl ActionConfig {
    /// Whether the action costs nothing.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn orchestrator_defaults() {
        let config: OrchestratorConfig = serde_json::from_value(json!({
            "twin_address": "0x7777777777777777777777777777777777777777",
            "remote_sol_token": "0x4444444444444444444444444444444444444444",
        }))
        .unwrap();

        assert_eq!(config.confirmation_timeout_ms, 60_000);
        assert_eq!(config.poll_interval_ms, 1_000);
        assert_eq!(config.bridge_fee_lamports, 0);
        assert_eq!(config.quote_ttl_ms, 30_000);
        assert_eq!(config.destination_gas_limit, DEFAULT_GAS_LIMIT);
    }

    #[rstest]
    #[case::string_price(json!("2500000000000000000"), false)]
    #[case::integer_price(json!(0), true)]
    #[case::zero_string(json!("0"), true)]
    fn action_price(#[case] price: serde_json::Value, #[case] free: bool) {
        let action: ActionConfig = serde_json::from_value(json!({
            "name": "open-pack",
            "action_id": format!("0x{}", "01".repeat(32)),
            "price": price,
        }))
        .unwrap();

        assert_eq!(action.is_free(), free);
        assert!(!action.requires_setup);
        assert!(action.action_data.is_empty());
    }

    #[test]
    fn unknown_action_field_is_rejected() {
        let err = serde_json::from_value::<ActionConfig>(json!({
            "name": "open-pack",
            "action_id": format!("0x{}", "01".repeat(32)),
            "price": "1",
            "cost": "1",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cost"));
    }

    #[test]
    fn program_ids_are_parsed() {
        let ids = ProgramIds {
            bridge_program: Pubkey::new_unique(),
            game_program: Pubkey::new_unique(),
            gas_fee_receiver: Pubkey::new_unique(),
        };
        let config = SolanaConfig {
            rpc_url: "http://localhost:8899".to_string(),
            bridge_program_id: ids.bridge_program.to_string(),
            game_program_id: ids.game_program.to_string(),
            gas_fee_receiver: ids.gas_fee_receiver.to_string(),
        };
        assert_eq!(config.program_ids().unwrap(), ids);

        let bad = SolanaConfig {
            game_program_id: "not-a-pubkey".to_string(),
            ..config
        };
        let err = bad.program_ids().unwrap_err();
        assert_eq!(err.to_string(), "invalid game_program_id");
    }
}

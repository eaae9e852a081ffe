//! Configuration of the quote route.

use alloy::primitives::{Address, U256};
use twin_bridge_relayer_lib::utils::serde::number_as_string;

/// Default slippage tolerance, 1%.
pub const DEFAULT_SLIPPAGE_BPS: u16 = 100;

/// First leg: bridged SOL to the intermediate token through a Uniswap V3 pool.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct UniswapV3LegConfig {
    /// `QuoterV2` contract.
    pub quoter: Address,
    /// `SwapRouter` the executor swaps through.
    pub router: Address,
    /// Bridged SOL token on Base.
    pub token_in: Address,
    /// Intermediate token.
    pub token_out: Address,
    /// Pool fee tier, e.g. `3000` for 0.3%.
    pub fee: u32,
}

/// Second leg: intermediate token to the priced token through a V2 pair.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct UniswapV2LegConfig {
    /// Router priced with `getAmountsOut` and swapped through.
    pub router: Address,
    /// Intermediate token.
    pub token_in: Address,
    /// Token prices are set in.
    pub token_out: Address,
}

/// Configuration for the quote engine.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuoteConfig {
    /// Bridged SOL to the intermediate token.
    pub leg1: UniswapV3LegConfig,
    /// Intermediate token to the priced token.
    pub leg2: UniswapV2LegConfig,
    /// `IMultiHopSwapper` that executes the route on Base.
    pub swap_executor: Address,
    /// Slippage used when the caller passes none.
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u16,
    /// Input amount used to size the route, in the first leg's input token.
    #[serde(with = "number_as_string")]
    pub probe_amount: U256,
}

const fn default_slippage_bps() -> u16 {
    DEFAULT_SLIPPAGE_BPS
}

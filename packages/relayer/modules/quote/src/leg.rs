//! A single hop of the quote route.

use std::fmt;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of one leg quote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegError {
    /// The pool does not exist or cannot fill the amount.
    #[error("no liquidity")]
    NoLiquidity,

    /// The quote call reverted for another reason.
    #[error("quote reverted: {0}")]
    Reverted(String),

    /// The node could not be reached or returned garbage.
    #[error("transport error: {0}")]
    Transport(String),
}

impl LegError {
    /// Whether asking again later can succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::NoLiquidity)
    }
}

/// AMM family a hop trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    /// Concentrated liquidity pool.
    UniswapV3,
    /// Constant-product pair.
    UniswapV2,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniswapV3 => f.write_str("uniswap-v3"),
            Self::UniswapV2 => f.write_str("uniswap-v2"),
        }
    }
}

/// Static description of a hop, as the swap executor needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Hop {
    /// AMM family of the pool.
    pub venue: Venue,
    /// Router the executor swaps through.
    pub router: Address,
    /// Token sold.
    pub token_in: Address,
    /// Token bought.
    pub token_out: Address,
    /// Pool fee in hundredths of a bip. Zero for V2 pairs.
    pub fee: u32,
}

/// An on-chain AMM that can price an exact-input swap.
#[async_trait]
pub trait AmmLeg: Send + Sync {
    /// The hop this leg prices.
    fn hop(&self) -> Hop;

    /// Output amount for swapping exactly `amount_in`.
    ///
    /// # Errors
    /// [`LegError::NoLiquidity`] if the pool cannot fill the swap, otherwise
    /// the revert or transport failure.
    async fn quote_exact_input(&self, amount_in: U256) -> Result<U256, LegError>;
}

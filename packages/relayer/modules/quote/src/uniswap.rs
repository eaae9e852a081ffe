//! Uniswap V3 and V2 legs, quoted through `eth_call`.

use alloy::{
    contract::Error as ContractError,
    primitives::{
        aliases::{U160, U24},
        Address, U256,
    },
    providers::RootProvider,
    sol_types::decode_revert_reason,
};
use async_trait::async_trait;
use twin_bridge_solidity_types::amm::{
    IQuoterV2::{self, IQuoterV2Instance},
    IUniswapV2Router02::{self, IUniswapV2Router02Instance},
};

use crate::{
    config::{UniswapV2LegConfig, UniswapV3LegConfig},
    leg::{AmmLeg, Hop, LegError, Venue},
};

/// Leg priced by a Uniswap V3 `QuoterV2` against a single pool.
#[derive(Debug, Clone)]
pub struct UniswapV3Leg {
    quoter: IQuoterV2Instance<RootProvider>,
    hop: Hop,
}

impl UniswapV3Leg {
    /// Create a new [`UniswapV3Leg`] instance.
    #[must_use]
    pub fn new(provider: RootProvider, config: &UniswapV3LegConfig) -> Self {
        Self {
            quoter: IQuoterV2::new(config.quoter, provider),
            hop: Hop {
                venue: Venue::UniswapV3,
                router: config.router,
                token_in: config.token_in,
                token_out: config.token_out,
                fee: config.fee,
            },
        }
    }
}

#[async_trait]
impl AmmLeg for UniswapV3Leg {
    fn hop(&self) -> Hop {
        self.hop
    }

    async fn quote_exact_input(&self, amount_in: U256) -> Result<U256, LegError> {
        let params = IQuoterV2::QuoteExactInputSingleParams {
            tokenIn: self.hop.token_in,
            tokenOut: self.hop.token_out,
            amountIn: amount_in,
            fee: U24::from(self.hop.fee),
            sqrtPriceLimitX96: U160::ZERO,
        };

        let quoted = self
            .quoter
            .quoteExactInputSingle(params)
            .call()
            .await
            .map_err(classify)?;

        non_zero(quoted.amountOut)
    }
}

/// Leg priced by a Uniswap V2-style router over a direct pair.
#[derive(Debug, Clone)]
pub struct UniswapV2Leg {
    router: IUniswapV2Router02Instance<RootProvider>,
    hop: Hop,
}

impl UniswapV2Leg {
    /// Create a new [`UniswapV2Leg`] instance.
    #[must_use]
    pub fn new(provider: RootProvider, config: &UniswapV2LegConfig) -> Self {
        Self {
            router: IUniswapV2Router02::new(config.router, provider),
            hop: Hop {
                venue: Venue::UniswapV2,
                router: config.router,
                token_in: config.token_in,
                token_out: config.token_out,
                fee: 0,
            },
        }
    }

    fn path(&self) -> Vec<Address> {
        vec![self.hop.token_in, self.hop.token_out]
    }
}

#[async_trait]
impl AmmLeg for UniswapV2Leg {
    fn hop(&self) -> Hop {
        self.hop
    }

    async fn quote_exact_input(&self, amount_in: U256) -> Result<U256, LegError> {
        let amounts = self
            .router
            .getAmountsOut(amount_in, self.path())
            .call()
            .await
            .map_err(classify)?;

        let out = amounts
            .last()
            .copied()
            .ok_or_else(|| LegError::Reverted("empty amounts".to_string()))?;
        non_zero(out)
    }
}

fn non_zero(amount: U256) -> Result<U256, LegError> {
    if amount.is_zero() {
        return Err(LegError::NoLiquidity);
    }
    Ok(amount)
}

/// Maps a failed `eth_call` to a [`LegError`].
///
/// Quoters revert without data when the pool does not exist, and V2 routers
/// revert with `INSUFFICIENT_LIQUIDITY` on empty reserves. Both mean there is
/// no route through this leg.
fn classify(err: ContractError) -> LegError {
    if let Some(data) = err.as_revert_data() {
        // Empty data decodes as an empty UTF-8 reason.
        if data.is_empty() {
            return LegError::NoLiquidity;
        }
        return match decode_revert_reason(&data) {
            Some(reason) if reason.contains("LIQUIDITY") => LegError::NoLiquidity,
            Some(reason) => LegError::Reverted(reason),
            None => LegError::Reverted(data.to_string()),
        };
    }

    match err {
        ContractError::ZeroData(..) | ContractError::ContractNotDeployed => LegError::NoLiquidity,
        other => LegError::Transport(other.to_string()),
    }
}

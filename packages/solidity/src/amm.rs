//! AMM quoting interfaces and the destination swap executor.

rpc_sol! {
    /// Uniswap V3 `QuoterV2`.
    #[derive(Debug, PartialEq, Eq)]
    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params)
            external
            returns (
                uint256 amountOut,
                uint160 sqrtPriceX96After,
                uint32 initializedTicksCrossed,
                uint256 gasEstimate
            );
    }
}

rpc_sol! {
    /// Uniswap V2-style router.
    #[derive(Debug, PartialEq, Eq)]
    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path)
            external
            view
            returns (uint256[] memory amounts);
    }
}

alloy_sol_types::sol! {
    /// Multi-hop swap executor invoked by the Twin adapter on Base.
    #[derive(Debug, PartialEq, Eq)]
    interface IMultiHopSwapper {
        struct SwapHop {
            uint8 venue;
            address router;
            address tokenIn;
            address tokenOut;
            uint24 fee;
        }

        function swapExactInput(SwapHop[] calldata hops, uint256 amountIn, uint256 minAmountOut)
            external
            returns (uint256 amountOut);
    }
}

/// `SwapHop.venue` for a Uniswap V3 pool.
pub const VENUE_UNISWAP_V3: u8 = 0;
/// `SwapHop.venue` for a Uniswap V2-style pair.
pub const VENUE_UNISWAP_V2: u8 = 1;

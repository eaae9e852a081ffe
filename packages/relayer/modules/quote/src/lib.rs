//! Prices bridged actions in SOL.
//!
//! A price set in a Base token is converted to the amount of bridged SOL to
//! send by composing two on-chain AMM legs: a Uniswap V3 pool from bridged
//! SOL to an intermediate token, then a Uniswap V2-style pair to the priced
//! token.

#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod config;
pub mod engine;
pub mod leg;
pub mod uniswap;

pub use config::QuoteConfig;
pub use engine::{OnChainQuoteEngine, Quote, QuoteEngine, QuoteError, Quoter, Route};

//! Solidity types for the Solana to Base bridge and the contracts the relay
//! and quoting engine talk to.

#![deny(clippy::nursery, clippy::pedantic, warnings, unused_crate_dependencies)]

/// Expands a `sol!` block holding a single contract, generating its instance
/// when the `rpc` feature is enabled.
///
/// `#[sol(rpc)]` only attaches to the first item, so each contract needs its
/// own invocation.
macro_rules! rpc_sol {
    ($($body:tt)*) => {
        #[cfg(feature = "rpc")]
        alloy_sol_types::sol! {
            #[sol(rpc)]
            $($body)*
        }

        // NOTE: Some environments won't compile with the `rpc` features.
        #[cfg(not(feature = "rpc"))]
        alloy_sol_types::sol! {
            $($body)*
        }
    };
}

pub mod amm;
pub mod bridge;
pub mod msgs;
pub mod twin;

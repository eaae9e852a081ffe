//! Configuration and wiring shared by the relayer binary: loads the relayer
//! config and connects the relay, quoting and orchestration components to
//! their chains.

#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod config;
pub mod context;

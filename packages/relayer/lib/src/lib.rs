#![doc = include_str!("../README.md")]
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod account;
pub mod canonical;
pub mod codec;
pub mod hash;
pub mod report;
pub mod retry;
pub mod status;
pub mod utils;

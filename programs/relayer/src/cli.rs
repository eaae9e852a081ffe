//! Defines the command line interface for the relayer.

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "twin-bridge",
    version,
    about = "Solana to Base bridge relay and quote tool",
    long_about = "Decodes and hashes outgoing bridge messages, checks their status on Base,\nbuilds retry calldata, quotes bridged actions and runs them end to end."
)]
/// The command line interface for the relayer.
pub struct RelayerCli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands for the relayer.
#[derive(Clone, Debug, Parser)]
pub enum Commands {
    /// Decode and hash raw outgoing message account data. Needs no network.
    Decode(decode::Args),

    /// Fetch an outgoing message from Solana and report its status on Base.
    Inspect(inspect::Args),

    /// Build `relayMessages` calldata to retry a message on Base.
    Retry(retry::Args),

    /// Quote the SOL needed to pay a price on Base.
    Quote(quote::Args),

    /// Run a configured bridged action.
    Action(action::Args),
}

/// The arguments for the decode subcommand.
pub mod decode {
    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// Account data as hex, with or without a `0x` prefix.
        #[clap(long, conflicts_with = "file", required_unless_present = "file")]
        pub hex: Option<String>,
        /// File holding the raw account data.
        #[clap(long)]
        pub file: Option<String>,
        /// Address of the outgoing message account.
        #[clap(long)]
        pub pubkey: String,
        /// Gas limit to put in the canonical message.
        #[clap(long)]
        pub gas_limit: Option<u64>,
    }
}

/// The arguments for the inspect subcommand.
pub mod inspect {
    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The configuration file for the relayer.
        #[clap(long)]
        pub config: String,
        /// Address of the outgoing message account.
        #[clap(long)]
        pub pubkey: String,
        /// Skip the status reads on Base.
        #[clap(long)]
        pub no_status: bool,
    }
}

/// The arguments for the retry subcommand.
pub mod retry {
    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The configuration file for the relayer.
        #[clap(long)]
        pub config: String,
        /// Address of the outgoing message account.
        #[clap(long)]
        pub pubkey: String,
        /// Execution gas for the message. Clamped to the configured maximum.
        #[clap(long)]
        pub gas_limit: Option<u64>,
        /// Build calldata even if the status does not allow a retry.
        #[clap(long)]
        pub force: bool,
    }
}

/// The arguments for the quote subcommand.
pub mod quote {
    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The configuration file for the relayer.
        #[clap(long)]
        pub config: String,
        /// Price in the priced token's base units, decimal or `0x` hex.
        #[clap(long)]
        pub price: String,
        /// Slippage tolerance in basis points. Uses the configured default if
        /// unset.
        #[clap(long)]
        pub slippage_bps: Option<u16>,
    }
}

/// The arguments for the action subcommand.
pub mod action {
    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The configuration file for the relayer.
        #[clap(long)]
        pub config: String,
        /// Name of the configured action.
        #[clap(long)]
        pub name: String,
        /// Solana CLI keypair file that signs and pays.
        #[clap(long)]
        pub keypair: String,
    }
}

use std::path::Path;

use clap::Parser;
use twin_bridge_relayer::cli::{Commands, RelayerCli};
use twin_bridge_relayer::commands;
use twin_bridge_relayer::observability::init_observability;
use twin_bridge_relayer_core::config::{ObservabilityConfig, RelayerConfig};

fn load(path: &str) -> anyhow::Result<RelayerConfig> {
    RelayerConfig::load(Path::new(path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = RelayerCli::parse();

    let config = match &cli.command {
        Commands::Decode(_) => None,
        Commands::Inspect(args) => Some(load(&args.config)?),
        Commands::Retry(args) => Some(load(&args.config)?),
        Commands::Quote(args) => Some(load(&args.config)?),
        Commands::Action(args) => Some(load(&args.config)?),
    };

    let observability = config
        .as_ref()
        .map_or_else(ObservabilityConfig::default, |c| c.observability.clone());
    let _guard = init_observability(&observability)?;
    tracing::debug!(level = %observability.level(), "observability initialized");

    let output = match (cli.command, config) {
        (Commands::Decode(args), _) => commands::run_decode(&args)?,
        (Commands::Inspect(args), Some(config)) => commands::run_inspect(&args, config).await?,
        (Commands::Retry(args), Some(config)) => commands::run_retry(&args, config).await?,
        (Commands::Quote(args), Some(config)) => commands::run_quote(&args, config).await?,
        (Commands::Action(args), Some(config)) => commands::run_action(&args, config).await?,
        (_, None) => anyhow::bail!("configuration is required"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

//! Defines the top level configuration for the relayer.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use alloy::primitives::Address;
use anyhow::Context;
use tracing::Level;
use twin_bridge_quote::QuoteConfig;
use twin_bridge_relayer_lib::retry::{
    GasLimits, DEFAULT_GAS_LIMIT, MAX_GAS_LIMIT, RELAY_OVERHEAD_GAS,
};
use twin_bridge_solana_to_base::{ActionConfig, OrchestratorConfig, SolanaConfig};

/// The top level configuration for the relayer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
#[allow(clippy::module_name_repetitions)]
pub struct RelayerConfig {
    /// Logging and trace export.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// The Solana side of the bridge.
    pub solana: SolanaConfig,
    /// The Base side of the bridge.
    pub base: BaseConfig,
    /// Gas bounds for relay retries.
    #[serde(default)]
    pub relay: RelayConfig,
    /// The two-leg quoting route.
    pub quote: QuoteConfig,
    /// Bridged action orchestration.
    pub orchestrator: OrchestratorConfig,
    /// The bridged actions that can be run.
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

/// Observability configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// The log level, e.g. `info` or `debug`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Whether to export traces and logs over OTLP.
    #[serde(default)]
    pub use_otel: bool,
    /// The service name reported to the collector.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// The OTLP gRPC endpoint. Uses the exporter default if unset.
    #[serde(default)]
    pub otel_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            use_otel: false,
            service_name: default_service_name(),
            otel_endpoint: None,
        }
    }
}

impl ObservabilityConfig {
    /// Returns the log level, falling back to `INFO` if it does not parse.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "twin-bridge-relayer".to_string()
}

/// Connection to Base and the bridge contracts on it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// The Base RPC URL.
    pub rpc_url: String,
    /// The `Bridge` contract that executes relayed messages.
    pub bridge_address: Address,
    /// The `BridgeValidator` contract that records validated messages.
    pub validator_address: Address,
}

/// Gas bounds for relay retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Gas limit used when the message does not carry one.
    #[serde(default = "default_gas_limit")]
    pub default_gas_limit: u64,
    /// Upper bound on any retry gas limit.
    #[serde(default = "max_gas_limit")]
    pub max_gas_limit: u64,
    /// Gas the relay itself spends on top of the message execution.
    #[serde(default = "relay_overhead_gas")]
    pub relay_overhead_gas: u64,
}

const fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

const fn max_gas_limit() -> u64 {
    MAX_GAS_LIMIT
}

const fn relay_overhead_gas() -> u64 {
    RELAY_OVERHEAD_GAS
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_gas_limit: DEFAULT_GAS_LIMIT,
            max_gas_limit: MAX_GAS_LIMIT,
            relay_overhead_gas: RELAY_OVERHEAD_GAS,
        }
    }
}

impl From<RelayConfig> for GasLimits {
    fn from(config: RelayConfig) -> Self {
        Self {
            default_gas_limit: config.default_gas_limit,
            max_gas_limit: config.max_gas_limit,
            relay_overhead_gas: config.relay_overhead_gas,
        }
    }
}

impl RelayerConfig {
    /// Reads, parses and validates the configuration file at `path`.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not valid JSON, does not match the
    /// configuration schema, or fails [`RelayerConfig::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bz = std::fs::read(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_slice(&bz)
            .with_context(|| format!("config {} is not valid JSON", path.display()))?;

        let config: Self = parse_config(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks constraints the schema cannot express.
    ///
    /// # Errors
    /// Fails on the first violated constraint.
    pub fn validate(&self) -> anyhow::Result<()> {
        let relay = &self.relay;
        anyhow::ensure!(relay.max_gas_limit > 0, "relay.max_gas_limit must be positive");
        anyhow::ensure!(
            (1..=relay.max_gas_limit).contains(&relay.default_gas_limit),
            "relay.default_gas_limit {} must be in [1, {}]",
            relay.default_gas_limit,
            relay.max_gas_limit
        );
        anyhow::ensure!(
            self.quote.default_slippage_bps < 10_000,
            "quote.default_slippage_bps {} must be below 10000",
            self.quote.default_slippage_bps
        );
        anyhow::ensure!(
            self.orchestrator.poll_interval_ms > 0,
            "orchestrator.poll_interval_ms must be positive"
        );

        let mut names = HashSet::new();
        for action in &self.actions {
            anyhow::ensure!(
                names.insert(action.name.as_str()),
                "duplicate action `{}`",
                action.name
            );
        }

        self.solana.program_ids()?;
        Ok(())
    }

    /// Looks up a configured action by name.
    ///
    /// # Errors
    /// Fails if no action has that name.
    pub fn action(&self, name: &str) -> anyhow::Result<&ActionConfig> {
        self.actions
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| anyhow::anyhow!("unknown action `{name}`"))
    }

    /// Gas bounds for relay retries.
    #[must_use]
    pub fn gas_limits(&self) -> GasLimits {
        self.relay.into()
    }
}

/// Parse a configuration value into the target struct while producing
/// detailed path-aware error messages.
///
/// Uses `serde_path_to_error` to include the exact JSON path of the failure
/// (e.g. `quote.leg1.fee`).
///
/// # Errors
/// Returns an [`anyhow::Error`] with the precise path and the original serde
/// error message.
pub fn parse_config<T>(value: serde_json::Value) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    // Round-trip through a string so the JSON deserializer reports line and
    // column information.
    let json_string = value.to_string();

    let mut deserializer = serde_json::Deserializer::from_str(&json_string);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer)
        .map_err(|e| anyhow::anyhow!("config error at {}: {}", e.path(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::io::Write;

    const BRIDGE_PROGRAM: &str = "11111111111111111111111111111112";
    const GAME_PROGRAM: &str = "11111111111111111111111111111113";
    const FEE_RECEIVER: &str = "11111111111111111111111111111114";

    fn base_json() -> serde_json::Value {
        json!({
            "solana": {
                "rpc_url": "http://localhost:8899",
                "bridge_program_id": BRIDGE_PROGRAM,
                "game_program_id": GAME_PROGRAM,
                "gas_fee_receiver": FEE_RECEIVER
            },
            "base": {
                "rpc_url": "http://localhost:8545",
                "bridge_address": "0x1111111111111111111111111111111111111111",
                "validator_address": "0x2222222222222222222222222222222222222222"
            },
            "quote": {
                "leg1": {
                    "quoter": "0x3333333333333333333333333333333333333333",
                    "router": "0x3434343434343434343434343434343434343434",
                    "token_in": "0x4444444444444444444444444444444444444444",
                    "token_out": "0x5555555555555555555555555555555555555555",
                    "fee": 3000
                },
                "leg2": {
                    "router": "0x6666666666666666666666666666666666666666",
                    "token_in": "0x5555555555555555555555555555555555555555",
                    "token_out": "0x7777777777777777777777777777777777777777"
                },
                "swap_executor": "0x8888888888888888888888888888888888888888",
                "probe_amount": "1000000000"
            },
            "orchestrator": {
                "twin_address": "0x9999999999999999999999999999999999999999",
                "remote_sol_token": "0x4444444444444444444444444444444444444444"
            },
            "actions": [
                {
                    "name": "open-pack",
                    "action_id": format!("0x{}", "01".repeat(32)),
                    "price": "2500000000000000000"
                },
                {
                    "name": "claim-daily",
                    "action_id": format!("0x{}", "02".repeat(32)),
                    "price": "0",
                    "requires_setup": true
                }
            ]
        })
    }

    #[test]
    fn parses_with_defaults() {
        let config: RelayerConfig = parse_config(base_json()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.observability, ObservabilityConfig::default());
        assert_eq!(config.gas_limits(), GasLimits::default());
        assert_eq!(config.quote.default_slippage_bps, 100);
        assert!(config.action("claim-daily").unwrap().is_free());
        assert!(!config.action("open-pack").unwrap().is_free());
        assert!(config.action("missing").is_err());
    }

    #[test]
    fn error_names_the_failing_path() {
        let mut value = base_json();
        value["quote"]["leg1"]["fee"] = json!("not-a-number");

        let err = parse_config::<RelayerConfig>(value).unwrap_err();
        assert!(err.to_string().contains("quote.leg1.fee"), "{err}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut value = base_json();
        value["base"]["l2_oracle"] = json!("0x00");

        let err = parse_config::<RelayerConfig>(value).unwrap_err();
        assert!(err.to_string().contains("l2_oracle"), "{err}");
    }

    #[rstest]
    #[case::duplicate_action(
        |v: &mut serde_json::Value| v["actions"][1]["name"] = json!("open-pack"),
        "duplicate action"
    )]
    #[case::slippage_out_of_range(
        |v: &mut serde_json::Value| v["quote"]["default_slippage_bps"] = json!(10_000),
        "default_slippage_bps"
    )]
    #[case::default_above_max(
        |v: &mut serde_json::Value| v["relay"] = json!({ "default_gas_limit": 3_000_000 }),
        "default_gas_limit"
    )]
    #[case::bad_program_id(
        |v: &mut serde_json::Value| v["solana"]["game_program_id"] = json!("zzz"),
        "game_program_id"
    )]
    fn validation_rejects(#[case] tweak: fn(&mut serde_json::Value), #[case] needle: &str) {
        let mut value = base_json();
        tweak(&mut value);

        let config: RelayerConfig = parse_config(value).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(needle), "{err}");
    }

    #[rstest]
    #[case("debug", Level::DEBUG)]
    #[case("WARN", Level::WARN)]
    #[case("nonsense", Level::INFO)]
    fn observability_level(#[case] level: &str, #[case] expected: Level) {
        let config = ObservabilityConfig {
            level: level.to_string(),
            ..Default::default()
        };
        assert_eq!(config.level(), expected);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(base_json().to_string().as_bytes()).unwrap();

        let config = RelayerConfig::load(file.path()).unwrap();
        assert_eq!(config.actions.len(), 2);

        let err = RelayerConfig::load(Path::new("/nonexistent/relayer.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}

use serde_json::json;
use twin_bridge_relayer_core::config::{parse_config, RelayerConfig};

/// Build a minimal valid relayer JSON configuration so that we can tweak it
/// in each test.
fn base_relayer_json() -> serde_json::Value {
    json!({
        "observability": {
            "level": "debug",
            "use_otel": false
        },
        "solana": {
            "rpc_url": "http://localhost:8899",
            "bridge_program_id": "11111111111111111111111111111112",
            "game_program_id": "11111111111111111111111111111113",
            "gas_fee_receiver": "11111111111111111111111111111114"
        },
        "base": {
            "rpc_url": "http://localhost:8545",
            "bridge_address": "0x1111111111111111111111111111111111111111",
            "validator_address": "0x2222222222222222222222222222222222222222"
        },
        "relay": {
            "max_gas_limit": 3000000
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
            "default_slippage_bps": 50,
            "probe_amount": 1000000000
        },
        "orchestrator": {
            "twin_address": "0x9999999999999999999999999999999999999999",
            "remote_sol_token": "0x4444444444444444444444444444444444444444",
            "bridge_fee_lamports": 5000
        },
        "actions": [
            {
                "name": "open-pack",
                "action_id": "0x0101010101010101010101010101010101010101010101010101010101010101",
                "price": "2500000000000000000",
                "action_data": "0xdeadbeef"
            }
        ]
    })
}

#[test]
fn test_valid_relayer_config() {
    let config: RelayerConfig = parse_config(base_relayer_json()).expect("config should parse");
    config.validate().expect("config should validate");

    assert_eq!(config.observability.level().as_str(), "DEBUG");
    assert_eq!(config.gas_limits().max_gas_limit, 3_000_000);
    assert_eq!(config.gas_limits().default_gas_limit, 500_000);
    assert_eq!(config.quote.default_slippage_bps, 50);
    assert_eq!(config.orchestrator.bridge_fee_lamports, 5000);
    assert_eq!(config.orchestrator.quote_ttl_ms, 30_000);

    let action = config.action("open-pack").unwrap();
    assert_eq!(action.action_data.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn test_missing_required_field() {
    let mut value = base_relayer_json();
    value["orchestrator"]
        .as_object_mut()
        .unwrap()
        .remove("twin_address");

    let err = parse_config::<RelayerConfig>(value).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("orchestrator"), "{msg}");
    assert!(msg.contains("twin_address"), "{msg}");
}

#[test]
fn test_invalid_address_reports_path() {
    let mut value = base_relayer_json();
    value["base"]["validator_address"] = json!("0x1234");

    let err = parse_config::<RelayerConfig>(value).unwrap_err();
    assert!(err.to_string().contains("base.validator_address"), "{err}");
}

#[test]
fn test_invalid_price_reports_path() {
    let mut value = base_relayer_json();
    value["actions"][0]["price"] = json!("ten");

    let err = parse_config::<RelayerConfig>(value).unwrap_err();
    assert!(err.to_string().contains("actions[0].price"), "{err}");
}

pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`EngineConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   chain.json
///   tokens.json
///   apis.json
///   timing.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                | Config Field                   |
/// |------------------------|--------------------------------|
/// | `AVAX_RPC_URL`         | `chain.rpc.http_url`           |
/// | `HOMORA_API_URL`       | `apis.homora_base_url`         |
/// | `PRICE_INDEX_URL`      | `apis.price_index_base_url`    |
/// | `BORROW_RATES_URL`     | `apis.borrow_rates_base_url`   |
/// | `BANK_FEE_MULTIPLIER`  | `apis.bank_fee_multiplier`     |
/// | `READ_TIMEOUT_SECONDS` | `timing.read_timeout_seconds`  |
///
/// The signing key is never part of the config; it is read from
/// `OWNER_PRIVATE_KEY` by the binary.
pub fn load_config(config_dir: &Path) -> Result<EngineConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let chain: ChainConfig =
        serde_json::from_str(&read("chain.json")?).context("parsing chain.json")?;

    let tokens = serde_json::from_str(&read("tokens.json")?).context("parsing tokens.json")?;

    let apis: ApiConfig = serde_json::from_str(&read("apis.json")?).context("parsing apis.json")?;

    let timing: TimingConfig =
        serde_json::from_str(&read("timing.json")?).context("parsing timing.json")?;

    let mut config = EngineConfig {
        app,
        chain,
        tokens,
        apis,
        timing,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Only non-empty env vars take effect. Parse failures are logged and skipped
/// (the JSON value remains).
fn apply_env_overrides(config: &mut EngineConfig) {
    if let Some(val) = env_string("AVAX_RPC_URL") {
        info!("env override: AVAX_RPC_URL");
        config.chain.rpc.http_url = val;
    }

    // -- External APIs -------------------------------------------------------
    if let Some(val) = env_string("HOMORA_API_URL") {
        info!("env override: HOMORA_API_URL");
        config.apis.homora_base_url = val;
    }

    if let Some(val) = env_string("PRICE_INDEX_URL") {
        info!("env override: PRICE_INDEX_URL");
        config.apis.price_index_base_url = val;
    }

    if let Some(val) = env_string("BORROW_RATES_URL") {
        info!("env override: BORROW_RATES_URL");
        config.apis.borrow_rates_base_url = val;
    }

    if let Some(val) = env_decimal("BANK_FEE_MULTIPLIER") {
        info!(%val, "env override: BANK_FEE_MULTIPLIER");
        config.apis.bank_fee_multiplier = val;
    }

    // -- Timing --------------------------------------------------------------
    if let Some(val) = env_parse::<u64>("READ_TIMEOUT_SECONDS") {
        info!(val, "env override: READ_TIMEOUT_SECONDS");
        config.timing.read_timeout_seconds = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// Read a non-empty env var and parse it as `Decimal`.
fn env_decimal(key: &str) -> Option<Decimal> {
    env_string(key).and_then(|v| Decimal::from_str(&v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_BANK_FEE_MULTIPLIER;
    use alloy::primitives::{address, Address};
    use serial_test::serial;
    use std::path::PathBuf;

    // Avalanche C-Chain deployment that config/chain.json must describe.
    const AVALANCHE_CHAIN_ID: u64 = 43114;
    const HOMORA_BANK: Address = address!("376d16C7dE138B01455a51dA79AD65806E9cd694");
    const AGGREGATOR_ORACLE: Address = address!("c842CC25FE89F0A60Fe9C1fd6483B6971020Eb3A");
    const TRADER_JOE_SPELL: Address = address!("dBc2Aa11Aa01bAa22892dE745C661Db9f204b2cd");
    const W_MASTERCHEF_JOE_V2: Address = address!("B41DE9c1f50697cC3Fd63F24EdE2B40f6269CBcb");
    const PANGOLIN_SPELL_V2: Address = address!("966bbec3ac35452133B5c236b4139C07b1e2c9b1");
    const W_MINICHEF_PNG: Address = address!("a67CF61b0b9BC39c6df04095A118e53BFb9303c7");
    const PANGOLIN_MINICHEF_V2: Address = address!("1f806f7C8dED893fd3caE279191ad7Aa3798E928");
    const TOKEN_WAVAX: Address = address!("B31f66AA3C1e785363F0875A1B74E27b85FD66c7");
    const TOKEN_USDC_E: Address = address!("A7D7079b0FEaD91F3e65f86E8915Cb59c1a4C664");

    fn project_config_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
    }

    fn write_test_configs(dir: &Path) {
        std::fs::write(
            dir.join("app.json"),
            r#"{ "logging": { "log_dir": "logs" } }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("chain.json"),
            r#"{
                "chain_id": 43114,
                "chain_name": "Avalanche C-Chain",
                "native_symbol": "WAVAX",
                "rpc": { "http_url": "https://api.avax.network/ext/bc/C/rpc" },
                "contracts": {
                    "homora_bank": "0x376d16C7dE138B01455a51dA79AD65806E9cd694",
                    "aggregate_oracle": "0xc842CC25FE89F0A60Fe9C1fd6483B6971020Eb3A"
                },
                "platforms": {
                    "trader_joe": {
                        "spell": "0xdBc2Aa11Aa01bAa22892dE745C661Db9f204b2cd",
                        "wrapper": "0xB41DE9c1f50697cC3Fd63F24EdE2B40f6269CBcb",
                        "staking": "0xd6a4F121CA35509aF06A0Be99093d08462f53052"
                    },
                    "pangolin_v2": {
                        "spell": "0x966bbec3ac35452133B5c236b4139C07b1e2c9b1",
                        "wrapper": "0xa67CF61b0b9BC39c6df04095A118e53BFb9303c7",
                        "staking": "0x1f806f7C8dED893fd3caE279191ad7Aa3798E928"
                    }
                }
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("tokens.json"),
            r#"{
                "WAVAX": { "address": "0xB31f66AA3C1e785363F0875A1B74E27b85FD66c7", "decimals": 18, "price_index_id": "avalanche-2" },
                "USDC.e": { "address": "0xA7D7079b0FEaD91F3e65f86E8915Cb59c1a4C664", "decimals": 6, "price_index_id": "usd-coin" }
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("apis.json"),
            r#"{
                "homora_base_url": "https://api.homora.alphaventuredao.io/v2/43114",
                "price_index_base_url": "https://api.coingecko.com/api/v3",
                "borrow_rates_base_url": "https://api.cream.finance/api/v1",
                "borrow_rate_network": "avalanche",
                "request_timeout_seconds": 10,
                "bank_fee_multiplier": "1.002"
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("timing.json"),
            r#"{
                "read_timeout_seconds": 10,
                "transaction": { "simulation_timeout_seconds": 15, "confirmation_timeout_seconds": 60 }
            }"#,
        )
        .unwrap();
    }

    /// Remove all engine-related env vars so tests don't interfere with each other.
    fn clean_engine_env() {
        for key in [
            "AVAX_RPC_URL",
            "HOMORA_API_URL",
            "PRICE_INDEX_URL",
            "BORROW_RATES_URL",
            "BANK_FEE_MULTIPLIER",
            "READ_TIMEOUT_SECONDS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_load_real_configs() {
        clean_engine_env();
        let dir = project_config_dir();
        if !dir.exists() {
            eprintln!("skipping: config dir not found at {}", dir.display());
            return;
        }
        let config = load_config(&dir).expect("config should load and validate");
        assert_eq!(config.chain.chain_id, AVALANCHE_CHAIN_ID);
        assert!(config.tokens.contains_key(&config.chain.native_symbol));

        let addr = |s: &str| s.parse::<Address>().unwrap();
        let chain = &config.chain;
        assert_eq!(addr(&chain.contracts.homora_bank), HOMORA_BANK);
        assert_eq!(addr(&chain.contracts.aggregate_oracle), AGGREGATOR_ORACLE);
        assert_eq!(addr(&chain.platforms.trader_joe.spell), TRADER_JOE_SPELL);
        assert_eq!(addr(&chain.platforms.trader_joe.wrapper), W_MASTERCHEF_JOE_V2);
        assert_eq!(addr(&chain.platforms.pangolin_v2.spell), PANGOLIN_SPELL_V2);
        assert_eq!(addr(&chain.platforms.pangolin_v2.wrapper), W_MINICHEF_PNG);
        assert_eq!(addr(&chain.platforms.pangolin_v2.staking), PANGOLIN_MINICHEF_V2);
        assert_eq!(addr(&config.tokens["WAVAX"].address), TOKEN_WAVAX);
        assert_eq!(addr(&config.tokens["USDC.e"].address), TOKEN_USDC_E);
    }

    #[test]
    #[serial]
    fn test_load_test_configs() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let config = load_config(tmp.path()).expect("test config should load");
        assert_eq!(config.chain.native_symbol, "WAVAX");
        assert_eq!(config.tokens["USDC.e"].decimals, 6);
        assert_eq!(config.apis.bank_fee_multiplier, Decimal::from_str("1.002").unwrap());
        assert_eq!(config.app.logging.file_name, "engine.log");
        assert_eq!(config.timing.transaction.receipt_poll_interval_ms, 1000);
        assert!(config.chain.contracts.safe_oracle.is_empty());
    }

    #[test]
    #[serial]
    fn test_fee_multiplier_defaults() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        std::fs::write(
            tmp.path().join("apis.json"),
            r#"{
                "homora_base_url": "https://api.homora.alphaventuredao.io/v2/43114",
                "price_index_base_url": "https://api.coingecko.com/api/v3",
                "borrow_rates_base_url": "https://api.cream.finance/api/v1",
                "borrow_rate_network": "avalanche",
                "request_timeout_seconds": 10
            }"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.apis.bank_fee_multiplier, DEFAULT_BANK_FEE_MULTIPLIER);
    }

    #[test]
    #[serial]
    fn test_missing_config_file_errors() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("failed to read config file"),
            "expected file-not-found error, got: {err}"
        );
    }

    #[test]
    #[serial]
    fn test_env_override_rpc_url() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("AVAX_RPC_URL", "https://custom-rpc.example.com");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.chain.rpc.http_url, "https://custom-rpc.example.com");
        clean_engine_env();
    }

    #[test]
    #[serial]
    fn test_env_override_api_urls_and_fee() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("HOMORA_API_URL", "http://localhost:9000/v2/43114");
        std::env::set_var("BANK_FEE_MULTIPLIER", "1.005");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.apis.homora_base_url, "http://localhost:9000/v2/43114");
        assert_eq!(config.apis.bank_fee_multiplier, Decimal::from_str("1.005").unwrap());
        clean_engine_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_string_ignored() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("READ_TIMEOUT_SECONDS", "");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.timing.read_timeout_seconds, 10);
        clean_engine_env();
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_parse_ignored() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("READ_TIMEOUT_SECONDS", "soon");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.timing.read_timeout_seconds, 10);
        clean_engine_env();
    }

    #[test]
    #[serial]
    fn test_env_override_fails_validation() {
        clean_engine_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("PRICE_INDEX_URL", "ftp://prices");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("price_index_base_url"), "{err}");
        clean_engine_env();
    }
}

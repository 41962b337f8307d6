use alloy::primitives::Address;
use anyhow::{bail, Result};
use rust_decimal::Decimal;

use super::types::EngineConfig;

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Every problem is collected so a broken config reports all of them at once.
/// Called automatically by [`super::load_config`].
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_chain_config(config, &mut errors);
    validate_token_table(config, &mut errors);
    validate_api_config(config, &mut errors);
    validate_timing_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// Chain config
// ---------------------------------------------------------------------------

fn validate_chain_config(config: &EngineConfig, errors: &mut Vec<String>) {
    let chain = &config.chain;

    if chain.rpc.http_url.is_empty() {
        errors.push("chain.rpc: http_url is empty".into());
    }

    let contracts = &chain.contracts;
    for (name, addr) in [
        ("homora_bank", &contracts.homora_bank),
        ("aggregate_oracle", &contracts.aggregate_oracle),
    ] {
        if let Err(e) = validate_address(addr) {
            errors.push(format!("chain.contracts.{name}: {e}"));
        }
    }

    // safe_oracle may be absent, but if set must be valid.
    if !contracts.safe_oracle.is_empty() {
        if let Err(e) = validate_address(&contracts.safe_oracle) {
            errors.push(format!("chain.contracts.safe_oracle: {e}"));
        }
    }

    let mut platforms = vec![
        ("trader_joe", &chain.platforms.trader_joe),
        ("pangolin_v2", &chain.platforms.pangolin_v2),
    ];
    if let Some(boosted) = &chain.platforms.trader_joe_boosted {
        platforms.push(("trader_joe_boosted", boosted));
    }
    for (name, platform) in platforms {
        for (field, addr) in [
            ("spell", &platform.spell),
            ("wrapper", &platform.wrapper),
            ("staking", &platform.staking),
        ] {
            if let Err(e) = validate_address(addr) {
                errors.push(format!("chain.platforms.{name}.{field}: {e}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Token reference table
// ---------------------------------------------------------------------------

fn validate_token_table(config: &EngineConfig, errors: &mut Vec<String>) {
    if config.tokens.is_empty() {
        errors.push("tokens: must have at least one token".into());
        return;
    }

    if !config.tokens.contains_key(&config.chain.native_symbol) {
        errors.push(format!(
            "tokens: native reference symbol '{}' is missing",
            config.chain.native_symbol
        ));
    }

    for (symbol, token) in &config.tokens {
        if let Err(e) = validate_address(&token.address) {
            errors.push(format!("tokens.{symbol}.address: {e}"));
        }
        if token.decimals > 28 {
            errors.push(format!(
                "tokens.{symbol}.decimals: {} exceeds the supported maximum of 28",
                token.decimals
            ));
        }
        if token.price_index_id.is_empty() {
            errors.push(format!("tokens.{symbol}.price_index_id: is empty"));
        }
    }
}

// ---------------------------------------------------------------------------
// APIs
// ---------------------------------------------------------------------------

fn validate_api_config(config: &EngineConfig, errors: &mut Vec<String>) {
    let apis = &config.apis;

    for (name, url) in [
        ("homora_base_url", &apis.homora_base_url),
        ("price_index_base_url", &apis.price_index_base_url),
        ("borrow_rates_base_url", &apis.borrow_rates_base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("apis.{name}: '{url}' is not an http(s) URL"));
        }
    }

    if apis.borrow_rate_network.is_empty() {
        errors.push("apis.borrow_rate_network: is empty".into());
    }

    if apis.request_timeout_seconds == 0 {
        errors.push("apis.request_timeout_seconds: must be > 0".into());
    }

    if apis.bank_fee_multiplier < Decimal::ONE {
        errors.push(format!(
            "apis.bank_fee_multiplier: {} must be >= 1",
            apis.bank_fee_multiplier
        ));
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

fn validate_timing_config(config: &EngineConfig, errors: &mut Vec<String>) {
    let timing = &config.timing;

    if timing.read_timeout_seconds == 0 {
        errors.push("timing.read_timeout_seconds: must be > 0".into());
    }
    if timing.transaction.simulation_timeout_seconds == 0 {
        errors.push("timing.transaction.simulation_timeout_seconds: must be > 0".into());
    }
    if timing.transaction.confirmation_timeout_seconds == 0 {
        errors.push("timing.transaction.confirmation_timeout_seconds: must be > 0".into());
    }
}

/// Check that a string parses as a 20-byte hex address.
pub fn validate_address(addr: &str) -> Result<Address, String> {
    if addr.is_empty() {
        return Err("address is empty".into());
    }
    addr.parse::<Address>()
        .map_err(|e| format!("invalid address '{addr}': {e}"))
}

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::constants::DEFAULT_BANK_FEE_MULTIPLIER;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub app: AppConfig,
    pub chain: ChainConfig,
    pub tokens: HashMap<String, TokenConfig>,
    pub apis: ApiConfig,
    pub timing: TimingConfig,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    #[serde(default = "default_log_file")]
    pub file_name: String,
    #[serde(default = "default_log_filter")]
    pub default_filter: String,
}

fn default_log_file() -> String {
    "engine.log".into()
}

fn default_log_filter() -> String {
    "lyf_engine=info,warn".into()
}

// ---------------------------------------------------------------------------
// chain.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub chain_name: String,
    /// Token-table symbol of the wrapped native asset the oracles quote in.
    pub native_symbol: String,
    pub rpc: RpcConfig,
    pub contracts: ContractsConfig,
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub http_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    pub homora_bank: String,
    /// Empty when the deployment has no safe oracle; pricing then starts at
    /// the aggregate tier.
    #[serde(default)]
    pub safe_oracle: String,
    pub aggregate_oracle: String,
}

/// Default contract addresses per platform, used when a pool listing does
/// not carry its own.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsConfig {
    pub trader_joe: PlatformContracts,
    #[serde(default)]
    pub trader_joe_boosted: Option<PlatformContracts>,
    pub pangolin_v2: PlatformContracts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformContracts {
    pub spell: String,
    pub wrapper: String,
    pub staking: String,
}

// ---------------------------------------------------------------------------
// tokens.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub address: String,
    pub decimals: u8,
    /// Identifier of the asset on the external price index.
    pub price_index_id: String,
}

// ---------------------------------------------------------------------------
// apis.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub homora_base_url: String,
    pub price_index_base_url: String,
    pub borrow_rates_base_url: String,
    pub borrow_rate_network: String,
    pub request_timeout_seconds: u64,
    #[serde(with = "rust_decimal::serde::str", default = "default_fee_multiplier")]
    pub bank_fee_multiplier: Decimal,
}

fn default_fee_multiplier() -> Decimal {
    DEFAULT_BANK_FEE_MULTIPLIER
}

// ---------------------------------------------------------------------------
// timing.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    pub read_timeout_seconds: u64,
    pub transaction: TransactionTiming,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionTiming {
    pub simulation_timeout_seconds: u64,
    pub confirmation_timeout_seconds: u64,
    #[serde(default = "default_poll_interval")]
    pub receipt_poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    1_000
}

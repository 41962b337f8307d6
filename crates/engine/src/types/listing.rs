//! Response shapes of the protocol's position, pool and APY listings.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// One entry of `GET /positions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionListing {
    #[serde(deserialize_with = "u64_from_str_or_number")]
    pub id: u64,
    pub owner: String,
    pub pool: PoolRef,
    #[serde(default)]
    pub collateral_size: Option<String>,
    #[serde(default)]
    pub collateral_credit: Option<String>,
    #[serde(default)]
    pub borrow_credit: Option<String>,
    #[serde(default)]
    pub debt_ratio: Option<String>,
}

impl PositionListing {
    /// Owner comparison is case-insensitive; listings use checksummed or
    /// lowercase addresses interchangeably.
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.eq_ignore_ascii_case(owner)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolRef {
    pub key: String,
}

/// One entry of `GET /pools`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolListing {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub exchange: ExchangeListing,
    pub tokens: Vec<String>,
    pub lp_token_address: String,
    pub w_token_type: String,
    #[serde(default)]
    pub w_token_address: Option<String>,
    #[serde(default)]
    pub spell_address: Option<String>,
    #[serde(default)]
    pub staking_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeListing {
    pub name: String,
    #[serde(default)]
    pub spell_address: Option<String>,
    #[serde(default)]
    pub staking_address: Option<String>,
    #[serde(default)]
    pub reward: Option<RewardListing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardListing {
    #[serde(alias = "tokenName", alias = "tokenSymbol", alias = "rewardTokenSymbol")]
    pub symbol: String,
    #[serde(default, alias = "rewardTokenAddress", alias = "tokenAddress")]
    pub address: Option<String>,
}

/// One value of `GET /apys`, keyed by pool key.
///
/// Rates arrive as JSON numbers or strings; `Decimal`'s own `Deserialize`
/// accepts both.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolApy {
    #[serde(rename = "tradingFeeAPY")]
    pub trading_fee_apy: Decimal,
    #[serde(rename = "farmingAPY")]
    pub farming_apy: Decimal,
    #[serde(rename = "totalAPY", default)]
    pub total_apy: Option<Decimal>,
}

pub type ApyListing = HashMap<String, PoolApy>;

/// Borrow-rate feed response: `{ "borrowRates": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRatesResponse {
    pub borrow_rates: Vec<BorrowRate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRate {
    pub token_symbol: String,
    pub apy: Decimal,
}

// ---------------------------------------------------------------------------
// Position ids arrive as numbers or numeric strings
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrU64 {
    Num(u64),
    Str(String),
}

fn u64_from_str_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match StrOrU64::deserialize(d)? {
        StrOrU64::Num(n) => Ok(n),
        StrOrU64::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

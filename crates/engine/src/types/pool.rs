use alloy::primitives::Address;
use serde::Serialize;
use std::fmt;

use super::token::Token;
use crate::errors::EngineError;

/// DEX integrations the bank routes liquidity through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dex {
    TraderJoe,
    PangolinV2,
}

impl Dex {
    /// Name as used by the protocol's pool listing.
    pub fn listing_name(&self) -> &'static str {
        match self {
            Self::TraderJoe => "Trader Joe",
            Self::PangolinV2 => "Pangolin V2",
        }
    }
}

impl fmt::Display for Dex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.listing_name())
    }
}

/// Reward-accounting shape of a staking wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardModel {
    /// `collateral * (acc - entry) / precision`.
    Simple,
    /// Accumulator offset by the wrapper's reward debt, plus the wrapper's
    /// own per-share rate.
    Boosted,
}

/// Wrapper-token type of a pool: selects the platform adapter, and with it
/// the reward model and auxiliary contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WrapperKind {
    /// Trader Joe `WMasterChefJoeV2`.
    MasterChefJoe,
    /// Trader Joe `WBoostedMasterChefJoe`.
    BoostedMasterChefJoe,
    /// Pangolin `WMiniChefV2PNG`.
    MiniChefPng,
}

impl WrapperKind {
    /// Map a listing's DEX name and wrapper-token type tag to a variant.
    pub fn from_listing(dex_name: &str, w_token_type: &str) -> Result<Self, EngineError> {
        match dex_name {
            "Pangolin V2" => Ok(Self::MiniChefPng),
            "Trader Joe" if w_token_type.starts_with("WMasterChef") => Ok(Self::MasterChefJoe),
            "Trader Joe" if w_token_type.starts_with("WBoostedMasterChef") => {
                Ok(Self::BoostedMasterChefJoe)
            }
            "Trader Joe" => Err(EngineError::NotImplemented {
                what: "Trader Joe wrapper-token type".into(),
                identifier: w_token_type.to_string(),
            }),
            other => Err(EngineError::NotImplemented {
                what: "DEX".into(),
                identifier: other.to_string(),
            }),
        }
    }

    pub fn dex(&self) -> Dex {
        match self {
            Self::MasterChefJoe | Self::BoostedMasterChefJoe => Dex::TraderJoe,
            Self::MiniChefPng => Dex::PangolinV2,
        }
    }

    pub fn reward_model(&self) -> RewardModel {
        match self {
            Self::MasterChefJoe | Self::MiniChefPng => RewardModel::Simple,
            Self::BoostedMasterChefJoe => RewardModel::Boosted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MasterChefJoe => "WMasterChefJoeV2",
            Self::BoostedMasterChefJoe => "WBoostedMasterChefJoe",
            Self::MiniChefPng => "WMiniChefV2PNG",
        }
    }
}

impl fmt::Display for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contracts a platform adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformAddresses {
    /// Default spell of the platform.
    pub spell: Address,
    /// ERC-1155 staking wrapper that mints the position's collateral.
    pub wrapper: Address,
    /// MasterChef/MiniChef the wrapper stakes into.
    pub staking: Address,
}

/// A resolved liquidity pool.
#[derive(Debug, Clone, Serialize)]
pub struct Pool {
    pub key: String,
    pub name: String,
    pub wrapper: WrapperKind,
    /// Underlying tokens in LP order (token0, token1).
    pub tokens: [Token; 2],
    pub lp_token: Address,
    pub contracts: PlatformAddresses,
    pub reward_token: Token,
    /// Pool-specific spell the bank should route actions through.
    pub spell_override: Option<Address>,
}

impl Pool {
    pub fn dex(&self) -> Dex {
        self.wrapper.dex()
    }
}

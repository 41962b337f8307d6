//! Resolves a position id and owner into a [`BoundPosition`]: listing lookup,
//! pool selection, token resolution, adapter binding and an on-chain
//! cross-check of owner and LP token.

use alloy::primitives::Address;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::ProtocolApi;
use crate::config::validate::validate_address;
use crate::config::{PlatformContracts, PlatformsConfig};
use crate::errors::EngineError;
use crate::execution::bank::HomoraBank;
use crate::execution::chain_client::ChainClient;
use crate::platforms::BoundPosition;
use crate::types::listing::{PoolListing, PositionListing};
use crate::types::{Dex, PlatformAddresses, Pool, Position, Token, TokenRegistry, WrapperKind};

// ---------------------------------------------------------------------------
// PlatformDirectory
// ---------------------------------------------------------------------------

/// Default contracts of each platform, used where a pool listing carries
/// none of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDirectory {
    trader_joe: PlatformAddresses,
    trader_joe_boosted: Option<PlatformAddresses>,
    pangolin_v2: PlatformAddresses,
}

impl PlatformDirectory {
    pub fn from_config(config: &PlatformsConfig) -> Result<Self, EngineError> {
        Ok(Self {
            trader_joe: parse_platform("trader_joe", &config.trader_joe)?,
            trader_joe_boosted: config
                .trader_joe_boosted
                .as_ref()
                .map(|c| parse_platform("trader_joe_boosted", c))
                .transpose()?,
            pangolin_v2: parse_platform("pangolin_v2", &config.pangolin_v2)?,
        })
    }

    pub fn defaults(&self, kind: WrapperKind) -> Option<PlatformAddresses> {
        match kind {
            WrapperKind::MasterChefJoe => Some(self.trader_joe),
            WrapperKind::BoostedMasterChefJoe => self.trader_joe_boosted,
            WrapperKind::MiniChefPng => Some(self.pangolin_v2),
        }
    }
}

fn parse_platform(name: &str, c: &PlatformContracts) -> Result<PlatformAddresses, EngineError> {
    let parse = |field: &str, value: &str| {
        validate_address(value).map_err(|e| EngineError::Config(format!("{name}.{field}: {e}")))
    };
    Ok(PlatformAddresses {
        spell: parse("spell", &c.spell)?,
        wrapper: parse("wrapper", &c.wrapper)?,
        staking: parse("staking", &c.staking)?,
    })
}

/// Reward token of a DEX when the listing does not name one.
fn default_reward_symbol(dex: Dex) -> &'static str {
    match dex {
        Dex::TraderJoe => "JOE",
        Dex::PangolinV2 => "PNG",
    }
}

// ---------------------------------------------------------------------------
// PositionResolver
// ---------------------------------------------------------------------------

pub struct PositionResolver {
    api: Arc<dyn ProtocolApi>,
    tokens: TokenRegistry,
    platforms: PlatformDirectory,
    client: Arc<dyn ChainClient>,
    bank: HomoraBank,
}

impl PositionResolver {
    pub fn new(
        api: Arc<dyn ProtocolApi>,
        tokens: TokenRegistry,
        platforms: PlatformDirectory,
        client: Arc<dyn ChainClient>,
        bank: HomoraBank,
    ) -> Self {
        Self {
            api,
            tokens,
            platforms,
            client,
            bank,
        }
    }

    /// Resolve one position by id and owner.
    pub async fn resolve(&self, position_id: u64, owner: Address) -> Result<BoundPosition, EngineError> {
        let (positions, pools) = tokio::try_join!(self.api.positions(), self.api.pools())?;
        let owner_str = owner.to_string();

        let listing = positions
            .iter()
            .find(|p| p.id == position_id && p.is_owned_by(&owner_str))
            .ok_or_else(|| EngineError::PositionNotFound {
                position_id,
                owner: owner_str.clone(),
            })?;

        self.bind_listing(listing, owner, &pools).await
    }

    /// Resolve every listed position of `owner`. One failing position fails
    /// the whole call.
    pub async fn positions_by_owner(&self, owner: Address) -> Result<Vec<BoundPosition>, EngineError> {
        let (positions, pools) = tokio::try_join!(self.api.positions(), self.api.pools())?;
        let owner_str = owner.to_string();

        let owned: Vec<&PositionListing> = positions.iter().filter(|p| p.is_owned_by(&owner_str)).collect();
        info!(%owner, count = owned.len(), "resolving owner positions");

        futures::future::try_join_all(
            owned
                .into_iter()
                .map(|listing| self.bind_listing(listing, owner, &pools)),
        )
        .await
    }

    async fn bind_listing(
        &self,
        listing: &PositionListing,
        owner: Address,
        pools: &[PoolListing],
    ) -> Result<BoundPosition, EngineError> {
        let pool = self.resolve_pool(&listing.pool.key, pools)?;
        let bound = BoundPosition::bind(
            Position {
                id: listing.id,
                owner,
                pool,
            },
            self.client.clone(),
        );
        self.verify_on_chain(&bound).await?;

        let pos = bound.position();
        info!(
            position_id = pos.id,
            pool = %pos.pool.key,
            platform = %pos.pool.wrapper,
            "position resolved"
        );
        Ok(bound)
    }

    /// Build the pool for `key` from the pool listing; exactly one entry
    /// must match.
    pub fn resolve_pool(&self, key: &str, pools: &[PoolListing]) -> Result<Pool, EngineError> {
        let mut matches = pools.iter().filter(|p| p.key == key);
        let listing = match (matches.next(), matches.next()) {
            (Some(listing), None) => listing,
            (None, _) => {
                return Err(EngineError::PoolResolution {
                    reason: format!("no pool listed under key {key}"),
                })
            }
            (Some(_), Some(_)) => {
                return Err(EngineError::PoolResolution {
                    reason: format!("multiple pools listed under key {key}"),
                })
            }
        };

        let wrapper = WrapperKind::from_listing(&listing.exchange.name, &listing.w_token_type)?;

        let tokens: [Token; 2] = match listing.tokens.as_slice() {
            [a, b] => [
                self.tokens.by_address_str(a)?.clone(),
                self.tokens.by_address_str(b)?.clone(),
            ],
            other => {
                return Err(EngineError::PoolResolution {
                    reason: format!("pool {key} lists {} tokens, expected 2", other.len()),
                })
            }
        };

        let reward_token = self.reward_token(listing, wrapper.dex())?;
        let contracts = self.contracts(listing, wrapper)?;
        let lp_token = parse_listed(key, "lpTokenAddress", &listing.lp_token_address)?;
        let spell_override = listing
            .spell_address
            .as_deref()
            .map(|s| parse_listed(key, "spellAddress", s))
            .transpose()?;

        debug!(pool = %key, %wrapper, %lp_token, ?spell_override, "pool resolved");
        Ok(Pool {
            key: listing.key.clone(),
            name: listing.name.clone(),
            wrapper,
            tokens,
            lp_token,
            contracts,
            reward_token,
            spell_override,
        })
    }

    fn reward_token(&self, listing: &PoolListing, dex: Dex) -> Result<Token, EngineError> {
        let token = match &listing.exchange.reward {
            Some(reward) => match &reward.address {
                Some(address) => self.tokens.by_address_str(address)?,
                None => self.tokens.by_symbol(&reward.symbol)?,
            },
            None => self.tokens.by_symbol(default_reward_symbol(dex))?,
        };
        Ok(token.clone())
    }

    /// Listing-supplied contracts, falling back to the platform defaults.
    fn contracts(&self, listing: &PoolListing, kind: WrapperKind) -> Result<PlatformAddresses, EngineError> {
        let key = &listing.key;
        let defaults = self.platforms.defaults(kind);
        let pick = |field: &str, listed: Option<&str>, default: Option<Address>| -> Result<Address, EngineError> {
            match (listed, default) {
                (Some(s), _) => parse_listed(key, field, s),
                (None, Some(address)) => Ok(address),
                (None, None) => Err(EngineError::NotImplemented {
                    what: format!("{field} for platform"),
                    identifier: kind.as_str().to_string(),
                }),
            }
        };

        Ok(PlatformAddresses {
            spell: pick(
                "spell",
                listing.exchange.spell_address.as_deref(),
                defaults.map(|d| d.spell),
            )?,
            wrapper: pick(
                "wrapper",
                listing.w_token_address.as_deref(),
                defaults.map(|d| d.wrapper),
            )?,
            staking: pick(
                "staking",
                listing
                    .staking_address
                    .as_deref()
                    .or(listing.exchange.staking_address.as_deref()),
                defaults.map(|d| d.staking),
            )?,
        })
    }

    /// The bank must agree on the owner, and the staking pool the collateral
    /// decodes to must hold the listed LP token.
    async fn verify_on_chain(&self, bound: &BoundPosition) -> Result<(), EngineError> {
        let pos = bound.position();
        let info = self.bank.position_info(pos.id).await?;
        if info.owner != pos.owner {
            return Err(EngineError::PositionNotFound {
                position_id: pos.id,
                owner: pos.owner.to_string(),
            });
        }

        let decoded = bound.decode_collateral(&info).await?;
        let accounting = bound.adapter().pool_accounting(decoded.pool_index).await?;
        if accounting.lp_token() != pos.pool.lp_token {
            return Err(EngineError::PoolResolution {
                reason: format!(
                    "collateral of position {} stakes {} but pool {} lists LP {}",
                    pos.id,
                    accounting.lp_token(),
                    pos.pool.key,
                    pos.pool.lp_token
                ),
            });
        }
        Ok(())
    }
}

fn parse_listed(key: &str, field: &str, value: &str) -> Result<Address, EngineError> {
    value.parse().map_err(|_| EngineError::PoolResolution {
        reason: format!("pool {key}: bad {field} {value}"),
    })
}

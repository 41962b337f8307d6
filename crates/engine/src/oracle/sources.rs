//! On-chain native-price tiers.

use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::EngineError;
use crate::execution::chain_client::{read, ChainClient};
use crate::execution::contracts::{IAggregatorOracle, ISafeOracle};
use crate::types::Q112;

/// One tier of the on-chain price chain.
#[async_trait]
pub trait NativePriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// UQ112.112 price of one raw token unit in the native asset.
    async fn q112_price(&self, token: Address) -> Result<Q112, EngineError>;
}

/// Cross-validating oracle; reverts when its sources disagree.
pub struct SafeOracleSource {
    client: Arc<dyn ChainClient>,
    address: Address,
}

impl SafeOracleSource {
    pub fn new(client: Arc<dyn ChainClient>, address: Address) -> Self {
        Self { client, address }
    }
}

#[async_trait]
impl NativePriceSource for SafeOracleSource {
    fn name(&self) -> &'static str {
        "safe oracle"
    }

    async fn q112_price(&self, token: Address) -> Result<Q112, EngineError> {
        read(
            self.client.as_ref(),
            self.address,
            ISafeOracle::getSafeETHPxCall { token },
        )
        .await
        .map(Q112::from_raw)
    }
}

/// The bank's aggregate oracle.
pub struct AggregateOracleSource {
    client: Arc<dyn ChainClient>,
    address: Address,
}

impl AggregateOracleSource {
    pub fn new(client: Arc<dyn ChainClient>, address: Address) -> Self {
        Self { client, address }
    }
}

#[async_trait]
impl NativePriceSource for AggregateOracleSource {
    fn name(&self) -> &'static str {
        "aggregate oracle"
    }

    async fn q112_price(&self, token: Address) -> Result<Q112, EngineError> {
        read(
            self.client.as_ref(),
            self.address,
            IAggregatorOracle::getETHPxCall { token },
        )
        .await
        .map(Q112::from_raw)
    }
}

use alloy::primitives::{Address, U256};
use std::sync::Arc;

use crate::errors::EngineError;
use crate::execution::chain_client::{read, ChainClient};
use crate::execution::contracts::IUniswapV2Pair;

/// Reserves and supply of a UniswapV2-style LP pair, read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LpState {
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_supply: U256,
}

impl LpState {
    pub fn reserves(&self) -> [U256; 2] {
        [self.reserve0, self.reserve1]
    }
}

/// Read-only view of an LP pair contract.
#[derive(Clone)]
pub struct LpPair {
    client: Arc<dyn ChainClient>,
    address: Address,
}

impl LpPair {
    pub fn new(client: Arc<dyn ChainClient>, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn reserves(&self) -> Result<(U256, U256), EngineError> {
        let r = read(
            self.client.as_ref(),
            self.address,
            IUniswapV2Pair::getReservesCall {},
        )
        .await?;
        Ok((U256::from(r.reserve0), U256::from(r.reserve1)))
    }

    pub async fn total_supply(&self) -> Result<U256, EngineError> {
        read(
            self.client.as_ref(),
            self.address,
            IUniswapV2Pair::totalSupplyCall {},
        )
        .await
    }

    pub async fn tokens(&self) -> Result<(Address, Address), EngineError> {
        let client = self.client.as_ref();
        tokio::try_join!(
            read(client, self.address, IUniswapV2Pair::token0Call {}),
            read(client, self.address, IUniswapV2Pair::token1Call {}),
        )
    }

    /// Reserves and total supply, read concurrently.
    pub async fn state(&self) -> Result<LpState, EngineError> {
        let ((reserve0, reserve1), total_supply) =
            tokio::try_join!(self.reserves(), self.total_supply())?;
        Ok(LpState {
            reserve0,
            reserve1,
            total_supply,
        })
    }
}

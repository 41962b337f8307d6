//! Trader Joe `WMasterChefJoeV2` pools: simple reward model over
//! MasterChefJoeV2, precision 1e12.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{
    wrapper, AddLiquidity, CollateralDecoder, CollateralId, DecodedCollateral, LpPair,
    PlatformAdapter, PoolAccounting, RemoveLiquidity, SimplePoolAccounting,
};
use crate::errors::EngineError;
use crate::execution::chain_client::{read, ChainClient};
use crate::execution::contracts::{IMasterChefJoeV2, ITraderJoeSpell, IWrappedChef};
use crate::types::{PlatformAddresses, WrapperKind};

pub struct MasterChefJoeAdapter {
    client: Arc<dyn ChainClient>,
    addresses: PlatformAddresses,
}

impl MasterChefJoeAdapter {
    pub fn new(client: Arc<dyn ChainClient>, addresses: PlatformAddresses) -> Self {
        Self { client, addresses }
    }
}

#[async_trait]
impl PlatformAdapter for MasterChefJoeAdapter {
    fn kind(&self) -> WrapperKind {
        WrapperKind::MasterChefJoe
    }

    fn addresses(&self) -> PlatformAddresses {
        self.addresses
    }

    async fn pool_accounting(&self, pool_index: U256) -> Result<PoolAccounting, EngineError> {
        let info = read(
            self.client.as_ref(),
            self.addresses.staking,
            IMasterChefJoeV2::poolInfoCall { pid: pool_index },
        )
        .await?;
        Ok(PoolAccounting::Simple(SimplePoolAccounting {
            lp_token: info.lpToken,
            acc_reward_per_share: info.accJoePerShare,
            alloc_point: info.allocPoint,
            last_reward_timestamp: info.lastRewardTimestamp.saturating_to(),
        }))
    }

    fn encode_add_liquidity(&self, params: &AddLiquidity) -> Bytes {
        let call = ITraderJoeSpell::addLiquidityWMasterChefCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            amt: params.amounts(),
            pid: params.pool_index,
        };
        Bytes::from(call.abi_encode())
    }

    fn encode_remove_liquidity(&self, params: &RemoveLiquidity) -> Bytes {
        let call = ITraderJoeSpell::removeLiquidityWMasterChefCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            amt: params.repay_amounts(),
        };
        Bytes::from(call.abi_encode())
    }

    fn encode_claim_rewards(&self) -> Bytes {
        Bytes::from(ITraderJoeSpell::harvestWMasterChefCall {}.abi_encode())
    }

    fn action_name(&self, payload: &[u8]) -> Option<&'static str> {
        let selector: [u8; 4] = payload.get(..4)?.try_into().ok()?;
        match selector {
            ITraderJoeSpell::addLiquidityWMasterChefCall::SELECTOR => {
                Some("addLiquidityWMasterChef")
            }
            ITraderJoeSpell::removeLiquidityWMasterChefCall::SELECTOR => {
                Some("removeLiquidityWMasterChef")
            }
            ITraderJoeSpell::harvestWMasterChefCall::SELECTOR => Some("harvestWMasterChef"),
            _ => None,
        }
    }

    fn lp_contract(&self, address: Address) -> LpPair {
        LpPair::new(self.client.clone(), address)
    }
}


#[async_trait]
impl CollateralDecoder for MasterChefJoeAdapter {
    type Wrapper = wrapper::MasterChefJoe;

    async fn decode_collateral_id(
        &self,
        id: CollateralId<Self::Wrapper>,
    ) -> Result<DecodedCollateral, EngineError> {
        let decoded = read(
            self.client.as_ref(),
            self.addresses.wrapper,
            IWrappedChef::decodeIdCall { id: id.raw() },
        )
        .await?;
        debug!(pid = %decoded.pid, entry = %decoded.rewardPerShare, "decoded WMasterChefJoeV2 id");
        Ok(DecodedCollateral {
            pool_index: decoded.pid,
            entry_reward_per_share: decoded.rewardPerShare,
        })
    }
}

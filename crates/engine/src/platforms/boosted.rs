//! Trader Joe `WBoostedMasterChefJoe` pools.
//!
//! Rewards accrue in two layers: the boosted chef credits the wrapper, and
//! the wrapper keeps its own per-share accumulator for its depositors. The
//! snapshot carries both, plus the wrapper's chef position (`userInfo`), so
//! the valuer can apply the boosted formula without further reads.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{
    wrapper, AddLiquidity, BoostedPoolAccounting, CollateralDecoder, CollateralId,
    DecodedCollateral, LpPair, PlatformAdapter, PoolAccounting, RemoveLiquidity,
};
use crate::errors::EngineError;
use crate::execution::chain_client::{read, ChainClient};
use crate::execution::contracts::{IBoostedMasterChefJoe, IBoostedTraderJoeSpell, IWBoostedMasterChefJoe};
use crate::types::{PlatformAddresses, WrapperKind};

pub struct BoostedMasterChefJoeAdapter {
    client: Arc<dyn ChainClient>,
    addresses: PlatformAddresses,
}

impl BoostedMasterChefJoeAdapter {
    pub fn new(client: Arc<dyn ChainClient>, addresses: PlatformAddresses) -> Self {
        Self { client, addresses }
    }
}

#[async_trait]
impl PlatformAdapter for BoostedMasterChefJoeAdapter {
    fn kind(&self) -> WrapperKind {
        WrapperKind::BoostedMasterChefJoe
    }

    fn addresses(&self) -> PlatformAddresses {
        self.addresses
    }

    async fn pool_accounting(&self, pool_index: U256) -> Result<PoolAccounting, EngineError> {
        let client = self.client.as_ref();
        let chef = self.addresses.staking;
        let wrapper = self.addresses.wrapper;

        let (info, user, wrapper_per_share) = tokio::try_join!(
            read(client, chef, IBoostedMasterChefJoe::poolInfoCall { pid: pool_index }),
            read(
                client,
                chef,
                IBoostedMasterChefJoe::userInfoCall {
                    pid: pool_index,
                    user: wrapper,
                }
            ),
            read(client, wrapper, IWBoostedMasterChefJoe::accJoePerShareCall {}),
        )?;

        debug!(
            pid = %pool_index,
            acc = %info.accJoePerShare,
            wrapper_acc = %wrapper_per_share,
            wrapper_lp = %user.amount,
            "boosted pool accounting"
        );

        Ok(PoolAccounting::Boosted(BoostedPoolAccounting {
            lp_token: info.lpToken,
            acc_reward_per_share: info.accJoePerShare,
            alloc_point: U256::from(info.allocPoint),
            last_reward_timestamp: info.lastRewardTimestamp,
            wrapper_reward_per_share: wrapper_per_share,
            wrapper_lp_amount: user.amount,
            wrapper_reward_debt: user.rewardDebt,
        }))
    }

    fn encode_add_liquidity(&self, params: &AddLiquidity) -> Bytes {
        let call = IBoostedTraderJoeSpell::addLiquidityWBoostedMasterChefCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            amt: params.amounts(),
            pid: params.pool_index,
        };
        Bytes::from(call.abi_encode())
    }

    fn encode_remove_liquidity(&self, params: &RemoveLiquidity) -> Bytes {
        let call = IBoostedTraderJoeSpell::removeLiquidityWBoostedMasterChefCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            amt: params.repay_amounts(),
        };
        Bytes::from(call.abi_encode())
    }

    fn encode_claim_rewards(&self) -> Bytes {
        Bytes::from(IBoostedTraderJoeSpell::harvestWBoostedMasterChefCall {}.abi_encode())
    }

    fn action_name(&self, payload: &[u8]) -> Option<&'static str> {
        let selector: [u8; 4] = payload.get(..4)?.try_into().ok()?;
        match selector {
            IBoostedTraderJoeSpell::addLiquidityWBoostedMasterChefCall::SELECTOR => {
                Some("addLiquidityWBoostedMasterChef")
            }
            IBoostedTraderJoeSpell::removeLiquidityWBoostedMasterChefCall::SELECTOR => {
                Some("removeLiquidityWBoostedMasterChef")
            }
            IBoostedTraderJoeSpell::harvestWBoostedMasterChefCall::SELECTOR => {
                Some("harvestWBoostedMasterChef")
            }
            _ => None,
        }
    }

    fn lp_contract(&self, address: Address) -> LpPair {
        LpPair::new(self.client.clone(), address)
    }
}


#[async_trait]
impl CollateralDecoder for BoostedMasterChefJoeAdapter {
    type Wrapper = wrapper::BoostedMasterChefJoe;

    async fn decode_collateral_id(
        &self,
        id: CollateralId<Self::Wrapper>,
    ) -> Result<DecodedCollateral, EngineError> {
        let decoded = read(
            self.client.as_ref(),
            self.addresses.wrapper,
            IWBoostedMasterChefJoe::decodeIdCall { id: id.raw() },
        )
        .await?;
        debug!(pid = %decoded.pid, entry = %decoded.joePerShare, "decoded WBoostedMasterChefJoe id");
        Ok(DecodedCollateral {
            pool_index: decoded.pid,
            entry_reward_per_share: decoded.joePerShare,
        })
    }
}

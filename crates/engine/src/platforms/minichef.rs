//! Pangolin V2 `WMiniChefV2PNG` pools: simple reward model over MiniChefV2.

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
use crate::execution::contracts::{IMiniChefV2, IPangolinSpellV2, IWrappedChef};
use crate::types::{PlatformAddresses, WrapperKind};

pub struct MiniChefPngAdapter {
    client: Arc<dyn ChainClient>,
    addresses: PlatformAddresses,
}

impl MiniChefPngAdapter {
    pub fn new(client: Arc<dyn ChainClient>, addresses: PlatformAddresses) -> Self {
        Self { client, addresses }
    }
}

#[async_trait]
impl PlatformAdapter for MiniChefPngAdapter {
    fn kind(&self) -> WrapperKind {
        WrapperKind::MiniChefPng
    }

    fn addresses(&self) -> PlatformAddresses {
        self.addresses
    }

    /// MiniChef splits pool state and LP address over two getters.
    async fn pool_accounting(&self, pool_index: U256) -> Result<PoolAccounting, EngineError> {
        let client = self.client.as_ref();
        let minichef = self.addresses.staking;
        let (info, lp_token) = tokio::try_join!(
            read(client, minichef, IMiniChefV2::poolInfoCall { pid: pool_index }),
            read(client, minichef, IMiniChefV2::lpTokenCall { pid: pool_index }),
        )?;
        Ok(PoolAccounting::Simple(SimplePoolAccounting {
            lp_token,
            acc_reward_per_share: U256::from(info.accRewardPerShare),
            alloc_point: U256::from(info.allocPoint),
            last_reward_timestamp: info.lastRewardTime,
        }))
    }

    fn encode_add_liquidity(&self, params: &AddLiquidity) -> Bytes {
        let call = IPangolinSpellV2::addLiquidityWMiniChefCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            amt: params.amounts(),
            pid: params.pool_index,
        };
        Bytes::from(call.abi_encode())
    }

    fn encode_remove_liquidity(&self, params: &RemoveLiquidity) -> Bytes {
        let call = IPangolinSpellV2::removeLiquidityWMiniChefCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            amt: params.repay_amounts(),
        };
        Bytes::from(call.abi_encode())
    }

    fn encode_claim_rewards(&self) -> Bytes {
        Bytes::from(IPangolinSpellV2::harvestWMiniChefRewardsCall {}.abi_encode())
    }

    fn action_name(&self, payload: &[u8]) -> Option<&'static str> {
        let selector: [u8; 4] = payload.get(..4)?.try_into().ok()?;
        match selector {
            IPangolinSpellV2::addLiquidityWMiniChefCall::SELECTOR => Some("addLiquidityWMiniChef"),
            IPangolinSpellV2::removeLiquidityWMiniChefCall::SELECTOR => {
                Some("removeLiquidityWMiniChef")
            }
            IPangolinSpellV2::harvestWMiniChefRewardsCall::SELECTOR => {
                Some("harvestWMiniChefRewards")
            }
            _ => None,
        }
    }

    fn lp_contract(&self, address: Address) -> LpPair {
        LpPair::new(self.client.clone(), address)
    }
}


#[async_trait]
impl CollateralDecoder for MiniChefPngAdapter {
    type Wrapper = wrapper::MiniChefPng;

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
        debug!(pid = %decoded.pid, entry = %decoded.rewardPerShare, "decoded WMiniChefV2PNG id");
        Ok(DecodedCollateral {
            pool_index: decoded.pid,
            entry_reward_per_share: decoded.rewardPerShare,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::ClosePosition;
    use crate::testing::{sample_addresses, MockChain};
    use alloy::sol_types::SolValue;

    #[tokio::test]
    async fn test_pool_accounting_combines_info_and_lp_token() {
        let addrs = sample_addresses();
        let chain = MockChain::new();
        let pid = U256::from(9u64);
        let lp = Address::repeat_byte(0x55);
        chain.respond(
            addrs.staking,
            IMiniChefV2::poolInfoCall { pid },
            (U256::from(77_000u64), U256::from(1_700_000_000u64), U256::from(400u64))
                .abi_encode_params(),
        );
        chain.respond(addrs.staking, IMiniChefV2::lpTokenCall { pid }, lp.abi_encode());

        let adapter = MiniChefPngAdapter::new(Arc::new(chain), addrs);
        let PoolAccounting::Simple(s) = adapter.pool_accounting(pid).await.unwrap() else {
            panic!("MiniChef pools use the simple model");
        };
        assert_eq!(s.lp_token, lp);
        assert_eq!(s.acc_reward_per_share, U256::from(77_000u64));
        assert_eq!(s.alloc_point, U256::from(400u64));
        assert_eq!(s.last_reward_timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_pool_accounting_fails_when_either_read_fails() {
        let addrs = sample_addresses();
        let chain = MockChain::new();
        let pid = U256::from(9u64);
        chain.respond(
            addrs.staking,
            IMiniChefV2::poolInfoCall { pid },
            (U256::from(1u64), U256::from(1u64), U256::from(1u64)).abi_encode_params(),
        );
        let adapter = MiniChefPngAdapter::new(Arc::new(chain), addrs);
        assert!(adapter.pool_accounting(pid).await.is_err());
    }

    #[test]
    fn test_close_and_claim_selectors() {
        let adapter = MiniChefPngAdapter::new(Arc::new(MockChain::new()), sample_addresses());
        let close = adapter.encode_close_position(&ClosePosition {
            collateral_size: U256::from(10u64),
            debt_a: U256::from(1u64),
            debt_b: U256::from(1u64),
            ..Default::default()
        });
        let decoded = IPangolinSpellV2::removeLiquidityWMiniChefCall::abi_decode(&close).unwrap();
        assert_eq!(decoded.amt.amtARepay, U256::MAX);
        assert_eq!(decoded.amt.amtBRepay, U256::MAX);

        assert_eq!(
            &adapter.encode_claim_rewards()[..4],
            IPangolinSpellV2::harvestWMiniChefRewardsCall::SELECTOR.as_slice()
        );
        assert_eq!(
            adapter.action_name(&adapter.encode_claim_rewards()),
            Some("harvestWMiniChefRewards")
        );
    }
}

//! Token prices in the native reference asset and in USD.
//!
//! Native prices come from an ordered list of on-chain tiers: each tier's
//! failure is logged and the next one is tried. The native asset's USD price
//! always comes from the external index, and its failure is fatal.

pub mod price_index;
pub mod sources;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::execution::chain_client::ChainClient;
use crate::types::{Token, TokenPrice};

pub use price_index::{CoinGeckoIndex, PriceIndex};
pub use sources::{AggregateOracleSource, NativePriceSource, SafeOracleSource};

pub struct PriceOracle {
    sources: Vec<Box<dyn NativePriceSource>>,
    index: Arc<dyn PriceIndex>,
    native: Token,
}

impl PriceOracle {
    /// Tiers are tried in the order given.
    pub fn new(
        sources: Vec<Box<dyn NativePriceSource>>,
        index: Arc<dyn PriceIndex>,
        native: Token,
    ) -> Self {
        Self {
            sources,
            index,
            native,
        }
    }

    /// Safe oracle first when the deployment has one, then the aggregate
    /// oracle.
    pub fn on_chain(
        client: Arc<dyn ChainClient>,
        safe_oracle: Option<Address>,
        aggregate_oracle: Address,
        index: Arc<dyn PriceIndex>,
        native: Token,
    ) -> Self {
        let mut sources: Vec<Box<dyn NativePriceSource>> = Vec::with_capacity(2);
        if let Some(safe) = safe_oracle {
            sources.push(Box::new(SafeOracleSource::new(client.clone(), safe)));
        }
        sources.push(Box::new(AggregateOracleSource::new(client, aggregate_oracle)));
        Self::new(sources, index, native)
    }

    pub fn native_token(&self) -> &Token {
        &self.native
    }

    /// Price of one whole `token` in the native asset.
    pub async fn native_price(&self, token: &Token) -> Result<Decimal, EngineError> {
        let mut last_error = None;
        for source in &self.sources {
            let attempt = match source.q112_price(token.address).await {
                Ok(q) => q.to_native_price(token.decimals),
                Err(e) => Err(e),
            };
            match attempt {
                Ok(price) => {
                    debug!(token = %token.symbol, source = source.name(), %price, "native price");
                    return Ok(price);
                }
                Err(e) => {
                    warn!(
                        token = %token.symbol,
                        source = source.name(),
                        error = %e,
                        "price tier failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(EngineError::unavailable(
            format!("on-chain price of {}", token.symbol),
            last_error.map_or_else(|| "no price tiers configured".to_string(), |e| e.to_string()),
        ))
    }

    /// USD price of the native reference asset.
    pub async fn native_usd(&self) -> Result<Decimal, EngineError> {
        self.index.usd_price(&self.native.price_index_id).await
    }

    /// Native and USD price of one whole `token`.
    pub async fn price(&self, token: &Token) -> Result<TokenPrice, EngineError> {
        let (native, native_usd) = tokio::try_join!(self.native_price(token), self.native_usd())?;
        TokenPrice::from_native(native, native_usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::contracts::{IAggregatorOracle, ISafeOracle};
    use crate::testing::{usdc, wavax, MockChain, MockPriceIndex};
    use crate::types::Q112;
    use alloy::primitives::U256;
    use alloy::sol_types::SolValue;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const SAFE: Address = Address::repeat_byte(0x5a);
    const AGG: Address = Address::repeat_byte(0xa9);

    /// `2^112 * 10^12`: one USDC.e (6 decimals) worth one native unit.
    fn one_native_for_six_decimals() -> U256 {
        (U256::from(1u64) << 112) * U256::from(10u64).pow(U256::from(12u64))
    }

    fn oracle(chain: MockChain, safe: bool) -> PriceOracle {
        PriceOracle::on_chain(
            Arc::new(chain),
            safe.then_some(SAFE),
            AGG,
            Arc::new(MockPriceIndex::default().with("avalanche-2", dec!(20))),
            wavax(),
        )
    }

    #[tokio::test]
    async fn test_falls_back_when_safe_oracle_reverts() {
        let chain = MockChain::new();
        let token = usdc();
        chain.revert(SAFE, ISafeOracle::getSafeETHPxCall { token: token.address }, "sources disagree");
        chain.respond(
            AGG,
            IAggregatorOracle::getETHPxCall { token: token.address },
            one_native_for_six_decimals().abi_encode(),
        );

        let price = oracle(chain, true).price(&token).await.unwrap();
        assert_eq!(price.native, dec!(1.0));
        assert_eq!(price.usd, dec!(20));
    }

    #[tokio::test]
    async fn test_safe_oracle_wins_when_it_answers() {
        let chain = MockChain::new();
        let token = usdc();
        chain.respond(
            SAFE,
            ISafeOracle::getSafeETHPxCall { token: token.address },
            (one_native_for_six_decimals() * U256::from(2u64)).abi_encode(),
        );
        chain.respond(
            AGG,
            IAggregatorOracle::getETHPxCall { token: token.address },
            one_native_for_six_decimals().abi_encode(),
        );

        let price = oracle(chain.clone(), true).native_price(&token).await.unwrap();
        assert_eq!(price, dec!(2));
        assert_eq!(chain.call_count(), 1);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_is_unavailable() {
        let chain = MockChain::new();
        let err = oracle(chain, true).native_price(&usdc()).await.unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_index_failure_is_fatal() {
        let chain = MockChain::new();
        let token = usdc();
        chain.respond(
            AGG,
            IAggregatorOracle::getETHPxCall { token: token.address },
            one_native_for_six_decimals().abi_encode(),
        );
        let oracle = PriceOracle::on_chain(
            Arc::new(chain),
            None,
            AGG,
            Arc::new(MockPriceIndex::default()),
            wavax(),
        );
        let err = oracle.price(&token).await.unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }));
    }

    proptest! {
        /// A failing primary tier yields exactly the fallback's price.
        #[test]
        fn fallback_equivalence(raw in 1u128..u128::MAX, decimals in 0u8..=18) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let mut token = usdc();
            token.decimals = decimals;
            let raw = U256::from(raw);

            let with_fallback = MockChain::new();
            with_fallback.revert(SAFE, ISafeOracle::getSafeETHPxCall { token: token.address }, "stale");
            with_fallback.respond(AGG, IAggregatorOracle::getETHPxCall { token: token.address }, raw.abi_encode());

            let via_chain = rt.block_on(oracle(with_fallback, true).native_price(&token)).unwrap();
            prop_assert_eq!(via_chain, Q112::from_raw(raw).to_native_price(decimals).unwrap());
        }
    }
}

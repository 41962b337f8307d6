//! Position valuation: equity, debt, leverage, rewards and APY.
//!
//! Every figure is recomputed from fresh reads. A failed component fails the
//! whole result; no partial valuation is ever returned.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use super::apy::{borrow_apy_for, leveraged_apy, DebtRate};
use super::rewards::accrued_reward;
use crate::api::{ApyFeed, BorrowRateFeed};
use crate::constants::ORACLE_REFERENCE_DECIMALS;
use crate::errors::EngineError;
use crate::execution::bank::HomoraBank;
use crate::oracle::PriceOracle;
use crate::platforms::BoundPosition;
use crate::types::fixed_point::{
    dec_add, dec_div, dec_mul, dec_sub, pro_rata_share, u256_to_decimal,
};
use crate::types::{
    ApyBreakdown, PositionDebt, RewardQuote, Token, TokenExposure, TokenPrice, ValuationSnapshot,
};

pub struct PositionValuer {
    bank: HomoraBank,
    oracle: Arc<PriceOracle>,
    apy_feed: Arc<dyn ApyFeed>,
    borrow_rates: Arc<dyn BorrowRateFeed>,
    fee_multiplier: Decimal,
}

impl PositionValuer {
    pub fn new(
        bank: HomoraBank,
        oracle: Arc<PriceOracle>,
        apy_feed: Arc<dyn ApyFeed>,
        borrow_rates: Arc<dyn BorrowRateFeed>,
        fee_multiplier: Decimal,
    ) -> Self {
        Self {
            bank,
            oracle,
            apy_feed,
            borrow_rates,
            fee_multiplier,
        }
    }

    /// Rewards accrued since the position's last interaction, priced in USD.
    pub async fn rewards_outstanding(&self, position: &BoundPosition) -> Result<RewardQuote, EngineError> {
        let token = position.position().pool.reward_token.clone();
        let raw = accrued_reward(&self.bank, position).await?;
        let amount = u256_to_decimal(raw, token.decimals)?;
        let price = self.oracle.price(&token).await?;
        let value_usd = dec_mul(amount, price.usd)?;

        debug!(
            position_id = position.position().id,
            token = %token.symbol,
            %amount,
            %value_usd,
            "rewards outstanding"
        );
        Ok(RewardQuote {
            amount,
            value_usd,
            token,
        })
    }

    /// Pro-rata LP holdings and bank debt of both pool tokens, priced.
    pub async fn position_value(&self, position: &BoundPosition) -> Result<ValuationSnapshot, EngineError> {
        let pos = position.position();
        let [token_a, token_b] = &pos.pool.tokens;

        // Collateral size is read once and reused for both tokens.
        let info = self.bank.position_info(pos.id).await?;
        let lp = position.adapter().lp_contract(pos.pool.lp_token);

        let (lp_state, native_usd, native_a, native_b, debt_a, debt_b) = tokio::try_join!(
            lp.state(),
            self.oracle.native_usd(),
            self.oracle.native_price(token_a),
            self.oracle.native_price(token_b),
            self.bank.borrow_balance(pos.id, token_a.address),
            self.bank.borrow_balance(pos.id, token_b.address),
        )?;

        let [reserve_a, reserve_b] = lp_state.reserves();
        let tokens = vec![
            exposure(
                token_a,
                pro_rata_share(reserve_a, info.collateral_size, lp_state.total_supply)?,
                debt_a,
                TokenPrice::from_native(native_a, native_usd)?,
            )?,
            exposure(
                token_b,
                pro_rata_share(reserve_b, info.collateral_size, lp_state.total_supply)?,
                debt_b,
                TokenPrice::from_native(native_b, native_usd)?,
            )?,
        ];

        let mut snapshot = ValuationSnapshot {
            equity_native: Decimal::ZERO,
            equity_usd: Decimal::ZERO,
            debt_native: Decimal::ZERO,
            debt_usd: Decimal::ZERO,
            position_native: Decimal::ZERO,
            position_usd: Decimal::ZERO,
            tokens: Vec::new(),
        };
        for t in &tokens {
            snapshot.position_native =
                dec_add(snapshot.position_native, dec_mul(t.owned, t.price.native)?)?;
            snapshot.position_usd = dec_add(snapshot.position_usd, dec_mul(t.owned, t.price.usd)?)?;
            snapshot.debt_native = dec_add(snapshot.debt_native, dec_mul(t.debt, t.price.native)?)?;
            snapshot.debt_usd = dec_add(snapshot.debt_usd, dec_mul(t.debt, t.price.usd)?)?;
        }
        snapshot.equity_native = dec_sub(snapshot.position_native, snapshot.debt_native)?;
        snapshot.equity_usd = dec_sub(snapshot.position_usd, snapshot.debt_usd)?;
        snapshot.tokens = tokens;

        info!(
            position_id = pos.id,
            pool = %pos.pool.key,
            position_usd = %snapshot.position_usd,
            debt_usd = %snapshot.debt_usd,
            equity_usd = %snapshot.equity_usd,
            "position valued"
        );
        Ok(snapshot)
    }

    /// Every token the position owes, as the bank lists them.
    pub async fn debts(&self, position: &BoundPosition) -> Result<Vec<PositionDebt>, EngineError> {
        self.bank.position_debts(position.position().id).await
    }

    /// Borrow credit over collateral credit, both as the bank values them.
    pub async fn debt_ratio(&self, position: &BoundPosition) -> Result<Decimal, EngineError> {
        let id = position.position().id;
        let (collateral, borrow) = tokio::try_join!(
            self.bank.collateral_credit(id),
            self.bank.borrow_credit(id),
        )?;
        ratio(borrow, collateral)
    }

    /// `position_usd / equity_usd`; zero equity yields zero.
    pub async fn leverage_ratio(&self, position: &BoundPosition) -> Result<Decimal, EngineError> {
        self.position_value(position).await?.leverage()
    }

    /// Leveraged APY split by source. Any feed failure aborts the whole
    /// computation.
    pub async fn current_apy(&self, position: &BoundPosition) -> Result<ApyBreakdown, EngineError> {
        self.compute_apy(position)
            .await
            .map_err(|e| EngineError::ApyUnavailable(Box::new(e)))
    }

    async fn compute_apy(&self, position: &BoundPosition) -> Result<ApyBreakdown, EngineError> {
        let pool_key = &position.position().pool.key;
        let (snapshot, pool_apy, rates) = tokio::try_join!(
            self.position_value(position),
            self.apy_feed.pool_apy(pool_key),
            self.borrow_rates.borrow_rates(),
        )?;

        let debts = snapshot
            .tokens
            .iter()
            .filter(|t| !t.debt.is_zero())
            .map(|t| {
                Ok(DebtRate {
                    debt_usd: dec_mul(t.debt, t.price.usd)?,
                    borrow_apy: borrow_apy_for(&rates, &t.symbol)?,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let apy = leveraged_apy(snapshot.leverage()?, &pool_apy, &debts, self.fee_multiplier)?;
        debug!(
            pool = %pool_key,
            total = %apy.total,
            trading_fee = %apy.trading_fee,
            farming = %apy.farming,
            borrow = %apy.borrow,
            "current APY"
        );
        Ok(apy)
    }
}

fn exposure(token: &Token, owned: U256, debt: U256, price: TokenPrice) -> Result<TokenExposure, EngineError> {
    Ok(TokenExposure {
        symbol: token.symbol.clone(),
        owned: u256_to_decimal(owned, token.decimals)?,
        debt: u256_to_decimal(debt, token.decimals)?,
        price,
    })
}

/// `numerator / denominator` of two wei-denominated credits; zero
/// denominator yields zero.
fn ratio(numerator: U256, denominator: U256) -> Result<Decimal, EngineError> {
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let n = u256_to_decimal(numerator, ORACLE_REFERENCE_DECIMALS)?;
    let d = u256_to_decimal(denominator, ORACLE_REFERENCE_DECIMALS)?;
    dec_div(n, d)
}

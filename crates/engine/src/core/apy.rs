//! Leveraged APY arithmetic.

use rust_decimal::Decimal;

use crate::errors::EngineError;
use crate::types::fixed_point::{dec_add, dec_div, dec_mul, dec_sub};
use crate::types::listing::{BorrowRate, PoolApy};
use crate::types::ApyBreakdown;

/// One borrowed token's weight input: its USD debt and borrow APY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtRate {
    pub debt_usd: Decimal,
    pub borrow_apy: Decimal,
}

/// Scale the pool's unleveraged APYs by `leverage` and charge borrow cost:
///
/// ```text
/// borrow = -max(leverage - 1, 0) * sum(w_i * apy_i * fee_multiplier)
/// ```
///
/// where `w_i` is the token's share of total USD debt. No debt means no
/// borrow cost.
pub fn leveraged_apy(
    leverage: Decimal,
    pool: &PoolApy,
    debts: &[DebtRate],
    fee_multiplier: Decimal,
) -> Result<ApyBreakdown, EngineError> {
    let trading_fee = dec_mul(leverage, pool.trading_fee_apy)?;
    let farming = dec_mul(leverage, pool.farming_apy)?;

    let total_debt = debts
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| dec_add(acc, d.debt_usd))?;
    let borrow = if total_debt.is_zero() {
        Decimal::ZERO
    } else {
        let mut weighted = Decimal::ZERO;
        for d in debts {
            let weight = dec_div(d.debt_usd, total_debt)?;
            let cost = dec_mul(dec_mul(weight, d.borrow_apy)?, fee_multiplier)?;
            weighted = dec_add(weighted, cost)?;
        }
        let borrowed_leverage = dec_sub(leverage, Decimal::ONE)?.max(Decimal::ZERO);
        -dec_mul(borrowed_leverage, weighted)?
    };

    Ok(ApyBreakdown {
        total: dec_add(dec_add(trading_fee, farming)?, borrow)?,
        trading_fee,
        farming,
        borrow,
    })
}

/// Borrow APY of `symbol`; exact symbol match first, then case-insensitive.
pub fn borrow_apy_for(rates: &[BorrowRate], symbol: &str) -> Result<Decimal, EngineError> {
    rates
        .iter()
        .find(|r| r.token_symbol == symbol)
        .or_else(|| rates.iter().find(|r| r.token_symbol.eq_ignore_ascii_case(symbol)))
        .map(|r| r.apy)
        .ok_or_else(|| EngineError::unavailable("borrow rates", format!("no rate for {symbol}")))
}

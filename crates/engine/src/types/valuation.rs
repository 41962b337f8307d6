use rust_decimal::Decimal;
use serde::Serialize;

use super::fixed_point::{dec_div, dec_mul};
use super::token::Token;
use crate::errors::EngineError;

/// Price of one whole token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenPrice {
    #[serde(with = "rust_decimal::serde::str")]
    pub native: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub usd: Decimal,
}

impl TokenPrice {
    /// USD price derived through the native asset's USD price.
    pub fn from_native(native: Decimal, native_usd: Decimal) -> Result<Self, EngineError> {
        Ok(Self {
            native,
            usd: dec_mul(native, native_usd)?,
        })
    }
}

/// Per-token contribution to a valuation.
#[derive(Debug, Clone, Serialize)]
pub struct TokenExposure {
    pub symbol: String,
    /// Pro-rata share of the LP reserve owned by the position, whole tokens.
    #[serde(with = "rust_decimal::serde::str")]
    pub owned: Decimal,
    /// Outstanding bank debt, whole tokens.
    #[serde(with = "rust_decimal::serde::str")]
    pub debt: Decimal,
    pub price: TokenPrice,
}

/// Equity, debt and gross value of a position, in native and USD units.
///
/// Derived fresh on every call; never cached.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationSnapshot {
    #[serde(with = "rust_decimal::serde::str")]
    pub equity_native: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub equity_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_native: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub debt_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub position_native: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub position_usd: Decimal,
    pub tokens: Vec<TokenExposure>,
}

impl ValuationSnapshot {
    /// `position_usd / equity_usd`; zero equity yields zero. Equity so close
    /// to zero that the quotient leaves `Decimal` range is `Overflow`.
    pub fn leverage(&self) -> Result<Decimal, EngineError> {
        if self.equity_usd.is_zero() {
            return Ok(Decimal::ZERO);
        }
        dec_div(self.position_usd, self.equity_usd)
    }
}

/// Outstanding farming rewards of a position.
#[derive(Debug, Clone, Serialize)]
pub struct RewardQuote {
    /// Whole reward tokens.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub value_usd: Decimal,
    pub token: Token,
}

impl RewardQuote {
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Leveraged APY of a position, split by source. `borrow` is non-positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApyBreakdown {
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub trading_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub farming: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub borrow: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(position_usd: Decimal, debt_usd: Decimal) -> ValuationSnapshot {
        ValuationSnapshot {
            equity_native: Decimal::ZERO,
            equity_usd: position_usd - debt_usd,
            debt_native: Decimal::ZERO,
            debt_usd,
            position_native: Decimal::ZERO,
            position_usd,
            tokens: Vec::new(),
        }
    }

    #[test]
    fn test_leverage() {
        assert_eq!(snapshot(dec!(300), dec!(150)).leverage().unwrap(), dec!(2));
        assert_eq!(snapshot(dec!(100), dec!(0)).leverage().unwrap(), dec!(1));
    }

    #[test]
    fn test_leverage_zero_equity_is_zero() {
        assert_eq!(snapshot(dec!(100), dec!(100)).leverage().unwrap(), Decimal::ZERO);
        assert_eq!(snapshot(dec!(0), dec!(0)).leverage().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_leverage_near_liquidation_is_an_error() {
        let mut near_zero = snapshot(dec!(1000), dec!(1000));
        near_zero.equity_usd = dec!(0.0000000000000000000000000001);
        assert!(matches!(near_zero.leverage(), Err(EngineError::Overflow(_))));
    }

    #[test]
    fn test_usd_price_overflow_is_an_error() {
        assert_eq!(
            TokenPrice::from_native(dec!(0.05), dec!(20)).unwrap().usd,
            dec!(1.00)
        );
        assert!(matches!(
            TokenPrice::from_native(Decimal::MAX, dec!(20)),
            Err(EngineError::Overflow(_))
        ));
    }

    #[test]
    fn test_snapshot_serializes_decimals_as_strings() {
        let json = serde_json::to_value(snapshot(dec!(3.5), dec!(1))).unwrap();
        assert_eq!(json["position_usd"], "3.5");
        assert_eq!(json["equity_usd"], "2.5");
    }
}

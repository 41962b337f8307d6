//! Conversions between on-chain integers and off-chain `Decimal` values.
//!
//! Every conversion is checked: a value that does not fit `Decimal` is an
//! error, never a silent zero.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use std::fmt;

use crate::constants::{ORACLE_PRICE_FRACTION_BITS, ORACLE_REFERENCE_DECIMALS};
use crate::errors::EngineError;

/// Largest mantissa `Decimal` can hold (2^96 - 1).
const MAX_MANTISSA: U256 = U256::from_limbs([u64::MAX, u32::MAX as u64, 0, 0]);

/// Largest scale `Decimal` supports.
const MAX_SCALE: i64 = 28;

// ---------------------------------------------------------------------------
// Q112 (UQ112.112) oracle prices
// ---------------------------------------------------------------------------

/// Native-asset price as returned by the bank oracles: a UQ112.112 value,
/// normalized against 18 decimals.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Q112(pub U256);

impl Q112 {
    pub fn from_raw(val: U256) -> Self {
        Self(val)
    }

    pub fn raw(self) -> U256 {
        self.0
    }

    /// Price of one whole token in the native asset:
    /// `raw / 2^112 / 10^(18 - token_decimals)`.
    pub fn to_native_price(self, token_decimals: u8) -> Result<Decimal, EngineError> {
        let scale = U256::from(10u64).pow(U256::from(token_decimals));
        let wad = match self.0.checked_mul(scale) {
            Some(scaled) => scaled >> ORACLE_PRICE_FRACTION_BITS,
            // Drop the fraction first when the full product does not fit.
            None => (self.0 >> ORACLE_PRICE_FRACTION_BITS)
                .checked_mul(scale)
                .ok_or_else(|| EngineError::Overflow(format!("oracle price {}", self.0)))?,
        };
        u256_to_decimal(wad, ORACLE_REFERENCE_DECIMALS)
    }
}

impl fmt::Debug for Q112 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q112({})", self.0)
    }
}

impl From<U256> for Q112 {
    fn from(val: U256) -> Self {
        Self(val)
    }
}

// ---------------------------------------------------------------------------
// Free-standing conversion helpers
// ---------------------------------------------------------------------------

/// Convert a raw token amount with `decimals` decimals to `Decimal`.
///
/// Values wider than `Decimal`'s 96-bit mantissa lose their least significant
/// digits; values whose integer part does not fit are an error.
pub fn u256_to_decimal(raw: U256, decimals: u8) -> Result<Decimal, EngineError> {
    let ten = U256::from(10u64);
    let mut value = raw;
    let mut scale = i64::from(decimals);

    while value > MAX_MANTISSA || scale > MAX_SCALE {
        value /= ten;
        scale -= 1;
    }

    let mantissa = u128::try_from(value)
        .map_err(|_| EngineError::Overflow(format!("{raw} does not fit a decimal")))?;
    // MAX_MANTISSA < i128::MAX
    let mantissa = mantissa as i128;

    if scale >= 0 {
        Decimal::try_from_i128_with_scale(mantissa, scale as u32)
            .map_err(|e| EngineError::Overflow(format!("{raw}: {e}")))
    } else {
        pow10(scale.unsigned_abs() as u32)
            .and_then(|factor| Decimal::from_i128_with_scale(mantissa, 0).checked_mul(factor))
            .ok_or_else(|| EngineError::Overflow(format!("{raw} does not fit a decimal")))
    }
}

/// Convert a whole-token `Decimal` into raw on-chain units, truncating any
/// precision beyond `decimals`.
pub fn decimal_to_u256(amount: Decimal, decimals: u8) -> Result<U256, EngineError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EngineError::invalid(format!(
            "amount must not be negative, got {amount}"
        )));
    }

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let ten = U256::from(10u64);
    let up = ten.pow(U256::from(decimals));
    let down = ten.pow(U256::from(amount.scale()));

    mantissa
        .checked_mul(up)
        .map(|scaled| scaled / down)
        .ok_or_else(|| EngineError::Overflow(format!("{amount} with {decimals} decimals")))
}

/// `floor(reserve * collateral / supply)`, with an empty supply yielding zero.
pub fn pro_rata_share(reserve: U256, collateral: U256, supply: U256) -> Result<U256, EngineError> {
    if supply.is_zero() {
        return Ok(U256::ZERO);
    }
    reserve
        .checked_mul(collateral)
        .map(|product| product / supply)
        .ok_or_else(|| EngineError::Overflow(format!("{reserve} * {collateral}")))
}

/// `10^exp` as a `Decimal`, `None` if it does not fit.
pub fn pow10(exp: u32) -> Option<Decimal> {
    (0..exp).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(Decimal::TEN))
}

// ---------------------------------------------------------------------------
// Checked Decimal arithmetic
// ---------------------------------------------------------------------------

pub fn dec_add(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_add(b)
        .ok_or_else(|| EngineError::Overflow(format!("{a} + {b}")))
}

pub fn dec_sub(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_sub(b)
        .ok_or_else(|| EngineError::Overflow(format!("{a} - {b}")))
}

pub fn dec_mul(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_mul(b)
        .ok_or_else(|| EngineError::Overflow(format!("{a} * {b}")))
}

/// Division by zero is reported as `Overflow` like any other out-of-range
/// result.
pub fn dec_div(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_div(b)
        .ok_or_else(|| EngineError::Overflow(format!("{a} / {b}")))
}

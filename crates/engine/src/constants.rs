use alloy::primitives::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Numeric Constants
// ---------------------------------------------------------------------------

/// Fractional bits of the bank oracles' native-asset prices (UQ112.112).
pub const ORACLE_PRICE_FRACTION_BITS: usize = 112;

/// Decimals the oracle price scale is normalized against.
pub const ORACLE_REFERENCE_DECIMALS: u8 = 18;

/// Reward-per-share scale of MasterChef/MiniChef style accumulators.
pub const SIMPLE_REWARD_PRECISION: U256 = U256::from_limbs([1_000_000_000_000, 0, 0, 0]);

/// Reward-per-share scale of the boosted MasterChef wrapper.
pub const BOOSTED_REWARD_PRECISION: U256 =
    U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Repay sentinel understood by the bank as "repay the whole debt".
pub const REPAY_MAX: U256 = U256::MAX;

/// Default bank fee multiplier applied to borrow APYs.
pub const DEFAULT_BANK_FEE_MULTIPLIER: Decimal = dec!(1.002);

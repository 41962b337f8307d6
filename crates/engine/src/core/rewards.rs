//! Outstanding farming rewards.
//!
//! The arithmetic is integer-exact and mirrors the wrappers' own accounting;
//! the async entry point only gathers the inputs.

use alloy::primitives::{I256, U256};
use tracing::debug;

use crate::constants::{BOOSTED_REWARD_PRECISION, SIMPLE_REWARD_PRECISION};
use crate::errors::EngineError;
use crate::execution::bank::HomoraBank;
use crate::platforms::{BoostedPoolAccounting, BoundPosition, PoolAccounting};

/// `collateral * (acc - entry) / 1e12`; zero when the accumulator has not
/// moved past the entry checkpoint.
pub fn simple_reward(collateral: U256, entry: U256, acc: U256) -> Result<U256, EngineError> {
    if acc <= entry {
        return Ok(U256::ZERO);
    }
    let delta = acc - entry;
    collateral
        .checked_mul(delta)
        .map(|scaled| scaled / SIMPLE_REWARD_PRECISION)
        .ok_or_else(|| EngineError::Overflow(format!("reward {collateral} * {delta}")))
}

/// Boosted wrapper accounting, pinned to the deployed contract:
///
/// ```text
/// extra = acc - rewardDebt * 1e18 / lpAmount      (0 when lpAmount is 0)
/// end   = wrapperPerShare + extra
/// reward = collateral * (end - entry) / 1e18      (0 when end <= entry)
/// ```
///
/// `extra` can be negative, so the per-share terms are signed.
pub fn boosted_reward(
    collateral: U256,
    entry: U256,
    pool: &BoostedPoolAccounting,
) -> Result<U256, EngineError> {
    let extra = if pool.wrapper_lp_amount.is_zero() {
        I256::ZERO
    } else {
        let debt_per_share = pool
            .wrapper_reward_debt
            .checked_mul(BOOSTED_REWARD_PRECISION)
            .ok_or_else(|| EngineError::Overflow("boosted reward debt per share".into()))?
            / pool.wrapper_lp_amount;
        signed(pool.acc_reward_per_share)?
            .checked_sub(signed(debt_per_share)?)
            .ok_or_else(|| EngineError::Overflow("boosted extra per share".into()))?
    };

    let end = signed(pool.wrapper_reward_per_share)?
        .checked_add(extra)
        .ok_or_else(|| EngineError::Overflow("boosted end per share".into()))?;
    let delta = end
        .checked_sub(signed(entry)?)
        .ok_or_else(|| EngineError::Overflow("boosted per-share delta".into()))?;

    if !delta.is_positive() {
        return Ok(U256::ZERO);
    }
    collateral
        .checked_mul(delta.into_raw())
        .map(|scaled| scaled / BOOSTED_REWARD_PRECISION)
        .ok_or_else(|| EngineError::Overflow(format!("reward {collateral} * {delta}")))
}

fn signed(value: U256) -> Result<I256, EngineError> {
    I256::try_from(value).map_err(|_| EngineError::Overflow(format!("per-share value {value}")))
}

/// Raw reward-token units accrued by a position since its last interaction.
///
/// Reads are strictly ordered: position info, then the collateral decode,
/// then the pool snapshot at the decoded index.
pub async fn accrued_reward(bank: &HomoraBank, position: &BoundPosition) -> Result<U256, EngineError> {
    let info = bank.position_info(position.position().id).await?;
    let decoded = position.decode_collateral(&info).await?;
    let accounting = position
        .adapter()
        .pool_accounting(decoded.pool_index)
        .await?;

    let reward = match &accounting {
        PoolAccounting::Simple(pool) => simple_reward(
            info.collateral_size,
            decoded.entry_reward_per_share,
            pool.acc_reward_per_share,
        )?,
        PoolAccounting::Boosted(pool) => {
            boosted_reward(info.collateral_size, decoded.entry_reward_per_share, pool)?
        }
    };

    debug!(
        position_id = position.position().id,
        model = ?position.position().pool.wrapper.reward_model(),
        pid = %decoded.pool_index,
        entry = %decoded.entry_reward_per_share,
        acc = %accounting.acc_reward_per_share(),
        reward = %reward,
        "accrued reward"
    );
    Ok(reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use proptest::prelude::*;

    fn boosted(acc: u128, wrapper: u128, lp: u128, debt: u128) -> BoostedPoolAccounting {
        BoostedPoolAccounting {
            lp_token: Address::ZERO,
            acc_reward_per_share: U256::from(acc),
            alloc_point: U256::ZERO,
            last_reward_timestamp: 0,
            wrapper_reward_per_share: U256::from(wrapper),
            wrapper_lp_amount: U256::from(lp),
            wrapper_reward_debt: U256::from(debt),
        }
    }

    #[test]
    fn test_simple_reward() {
        // 2e18 LP * 3e9 per-share delta / 1e12 = 6e15
        let reward = simple_reward(
            U256::from(2_000_000_000_000_000_000u128),
            U256::from(1_000_000_000u64),
            U256::from(4_000_000_000u64),
        )
        .unwrap();
        assert_eq!(reward, U256::from(6_000_000_000_000_000u64));
    }

    #[test]
    fn test_boosted_reward_round_numbers() {
        // extra = 3e18 - 4e18 * 1e18 / 2e18 = 1e18; end = 2.5e18; delta = 2e18
        let pool = boosted(
            3_000_000_000_000_000_000,
            1_500_000_000_000_000_000,
            2_000_000_000_000_000_000,
            4_000_000_000_000_000_000,
        );
        let reward = boosted_reward(
            U256::from(3_000_000_000_000_000_000u128),
            U256::from(500_000_000_000_000_000u128),
            &pool,
        )
        .unwrap();
        assert_eq!(reward, U256::from(6_000_000_000_000_000_000u128));
    }

    /// Snapshot of a live WBoostedMasterChefJoe position; any change to the
    /// pinned formula shows up here.
    #[test]
    fn test_boosted_reward_snapshot() {
        let pool = boosted(
            1_334_520_889_104_772_031_552,
            205_118_930_447_211_009,
            68_904_117_265_530_882_771_440,
            91_553_208_337_101_992_004_118_703,
        );
        let reward = boosted_reward(
            U256::from(48_213_774_901_233_118u128),
            U256::from(211_907_452_118_330_417u128),
            &pool,
        )
        .unwrap();
        assert_eq!(reward, U256::from(280_104_413_625_833_867u128));
    }

    #[test]
    fn test_boosted_negative_extra_is_not_clamped_early() {
        // extra = 1e18 - 3e18 = -2e18; end = 5e18 - 2e18 = 3e18; delta = 1e18
        let pool = boosted(
            1_000_000_000_000_000_000,
            5_000_000_000_000_000_000,
            1_000_000_000_000_000_000,
            3_000_000_000_000_000_000,
        );
        let reward = boosted_reward(
            U256::from(1_000_000_000_000_000_000u128),
            U256::from(2_000_000_000_000_000_000u128),
            &pool,
        )
        .unwrap();
        assert_eq!(reward, U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_boosted_zero_lp_amount_drops_extra() {
        let pool = boosted(9_000, 700, 0, 123);
        let reward = boosted_reward(U256::from(1_000_000_000_000_000_000u128), U256::from(200u64), &pool)
            .unwrap();
        assert_eq!(reward, U256::from(500u64));
    }

    proptest! {
        #[test]
        fn simple_reward_is_zero_without_accrual(
            collateral in any::<u64>(),
            acc in any::<u64>(),
            back in 0u64..1_000_000,
        ) {
            let entry = U256::from(acc) + U256::from(back);
            let reward = simple_reward(U256::from(collateral), entry, U256::from(acc)).unwrap();
            prop_assert_eq!(reward, U256::ZERO);
        }

        #[test]
        fn boosted_reward_is_zero_when_end_not_past_entry(
            collateral in any::<u64>(),
            wrapper in any::<u64>(),
            acc in any::<u64>(),
            debt in any::<u64>(),
            lp in 1u64..u64::MAX,
            ahead in 0u64..1_000_000,
        ) {
            let pool = boosted(acc as u128, wrapper as u128, lp as u128, debt as u128);
            // Entry at or beyond the largest possible end value.
            let entry = U256::from(wrapper) + U256::from(acc) + U256::from(ahead);
            let reward = boosted_reward(U256::from(collateral), entry, &pool).unwrap();
            prop_assert_eq!(reward, U256::ZERO);
        }

        #[test]
        fn simple_reward_is_monotone_in_accumulator(
            collateral in any::<u64>(),
            entry in any::<u64>(),
            a in any::<u64>(),
            b in any::<u64>(),
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let c = U256::from(collateral);
            let e = U256::from(entry);
            prop_assert!(
                simple_reward(c, e, U256::from(lo)).unwrap()
                    <= simple_reward(c, e, U256::from(hi)).unwrap()
            );
        }
    }
}

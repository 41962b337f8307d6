use alloy::primitives::{Address, U256};
use serde::Serialize;

use super::pool::Pool;

/// A bank position resolved against its pool.
///
/// The engine never opens or destroys positions; it reads them and mutates
/// their on-chain state through composed transactions.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub id: u64,
    pub owner: Address,
    pub pool: Pool,
}

/// `HomoraBank.getPositionInfo` snapshot.
///
/// Read once per operation; callers reuse it rather than re-reading the
/// collateral size mid-computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionInfo {
    pub owner: Address,
    pub collateral_token: Address,
    /// Raw, undecoded collateral id.
    pub collateral_id: U256,
    pub collateral_size: U256,
}

/// One entry of `HomoraBank.getPositionDebts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionDebt {
    pub token: Address,
    pub amount: U256,
}

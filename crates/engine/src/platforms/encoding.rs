//! Spell-agnostic parameter structs and their ABI tuple forms.

use alloy::primitives::{Address, U256};

use crate::constants::REPAY_MAX;
use crate::execution::contracts::{Amounts, RepayAmounts};

/// Parameters of an add-liquidity spell call, in raw token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    pub supply_a: U256,
    pub supply_b: U256,
    pub supply_lp: U256,
    pub borrow_a: U256,
    pub borrow_b: U256,
    pub borrow_lp: U256,
    pub min_a: U256,
    pub min_b: U256,
    /// Staking pool index the wrapper deposits into.
    pub pool_index: U256,
}

impl AddLiquidity {
    pub(crate) fn amounts(&self) -> Amounts {
        Amounts {
            amtAUser: self.supply_a,
            amtBUser: self.supply_b,
            amtLPUser: self.supply_lp,
            amtABorrow: self.borrow_a,
            amtBBorrow: self.borrow_b,
            amtLPBorrow: self.borrow_lp,
            amtAMin: self.min_a,
            amtBMin: self.min_b,
        }
    }
}

/// How much of one token's debt a remove-liquidity call repays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepayRequest {
    #[default]
    None,
    /// Whole debt, including interest accrued between read and execution.
    Full,
    /// Exact raw amount.
    Partial(U256),
}

impl RepayRequest {
    pub fn amount(self) -> U256 {
        match self {
            Self::None => U256::ZERO,
            Self::Full => REPAY_MAX,
            Self::Partial(amount) => amount,
        }
    }
}

/// Parameters of a remove-liquidity spell call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    /// Collateral taken out of the bank.
    pub lp_take: U256,
    /// LP returned to the owner as-is instead of being unwound.
    pub lp_withdraw: U256,
    pub repay_a: RepayRequest,
    pub repay_b: RepayRequest,
    pub repay_lp: RepayRequest,
    pub min_a: U256,
    pub min_b: U256,
}

impl RemoveLiquidity {
    pub(crate) fn repay_amounts(&self) -> RepayAmounts {
        RepayAmounts {
            amtLPTake: self.lp_take,
            amtLPWithdraw: self.lp_withdraw,
            amtARepay: self.repay_a.amount(),
            amtBRepay: self.repay_b.amount(),
            amtLPRepay: self.repay_lp.amount(),
            amtAMin: self.min_a,
            amtBMin: self.min_b,
        }
    }
}

/// Parameters of a full close: all collateral out, every debt repaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosePosition {
    pub token_a: Address,
    pub token_b: Address,
    pub collateral_size: U256,
    /// Debts as last read; only their zero-ness reaches the calldata.
    pub debt_a: U256,
    pub debt_b: U256,
    pub debt_lp: U256,
}

impl ClosePosition {
    /// Nonzero debts become the repay-max sentinel; zero stays zero.
    pub fn as_remove(&self) -> RemoveLiquidity {
        RemoveLiquidity {
            token_a: self.token_a,
            token_b: self.token_b,
            lp_take: self.collateral_size,
            lp_withdraw: U256::ZERO,
            repay_a: repay_all(self.debt_a),
            repay_b: repay_all(self.debt_b),
            repay_lp: repay_all(self.debt_lp),
            min_a: U256::ZERO,
            min_b: U256::ZERO,
        }
    }
}

/// `Full` for outstanding debt, `None` for none.
pub fn repay_all(debt: U256) -> RepayRequest {
    if debt.is_zero() {
        RepayRequest::None
    } else {
        RepayRequest::Full
    }
}

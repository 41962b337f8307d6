//! Composes bank transactions for a bound position and hands them to the
//! owner's [`TransactionSender`].
//!
//! Every mutation is a single `bank.execute(positionId, spell, payload)` call,
//! preceded for add-liquidity by one ERC-20 approval per supplied token.
//! Input validation and the signer check happen before any network access.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::rewards::accrued_reward;
use crate::errors::EngineError;
use crate::execution::bank::{ExecuteEnvelope, HomoraBank};
use crate::execution::chain_client::{read, ChainClient};
use crate::execution::contracts::IERC20;
use crate::execution::tx_submitter::TransactionSender;
use crate::platforms::encoding::repay_all;
use crate::platforms::{AddLiquidity, BoundPosition, ClosePosition, RemoveLiquidity, RepayRequest};
use crate::types::fixed_point::{decimal_to_u256, u256_to_decimal};
use crate::types::{Token, TransactionIntent, TransactionReceipt};

/// LP tokens of every supported pair carry 18 decimals.
const LP_DECIMALS: u8 = 18;

/// Fractions are applied to raw amounts at this precision.
const FRACTION_DECIMALS: u8 = 18;

/// Amounts of an add-liquidity request, in whole tokens, pool-token order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddLiquidityRequest {
    pub supply: [Decimal; 2],
    pub borrow: [Decimal; 2],
    pub supply_lp: Decimal,
    pub borrow_lp: Decimal,
}

/// Decoded bank transaction with the spell action it invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub envelope: ExecuteEnvelope,
    /// `None` when the payload is not one of the bound platform's actions.
    pub action: Option<&'static str>,
}

/// ERC-20 balance of one pool token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub token: Token,
    pub raw: U256,
    /// Whole tokens, scaled by the decimals the contract reports.
    pub amount: Decimal,
}

pub struct TransactionComposer {
    client: Arc<dyn ChainClient>,
    bank: HomoraBank,
    sender: Option<Arc<dyn TransactionSender>>,
}

impl TransactionComposer {
    /// Without a sender only the read-side helpers work.
    pub fn new(
        client: Arc<dyn ChainClient>,
        bank: HomoraBank,
        sender: Option<Arc<dyn TransactionSender>>,
    ) -> Self {
        Self {
            client,
            bank,
            sender,
        }
    }

    /// The sender for `action`, checked against the position's owner.
    fn sender_for(
        &self,
        position: &BoundPosition,
        action: &str,
    ) -> Result<&Arc<dyn TransactionSender>, EngineError> {
        let sender = self.sender.as_ref().ok_or_else(|| EngineError::MissingSigner {
            action: action.to_string(),
        })?;
        let owner = position.position().owner;
        if sender.owner() != owner {
            return Err(EngineError::invalid(format!(
                "signer {} does not own position {} (owner {owner})",
                sender.owner(),
                position.position().id,
            )));
        }
        Ok(sender)
    }

    fn execute_intent(&self, label: &str, position: &BoundPosition, payload: Bytes) -> TransactionIntent {
        let data = HomoraBank::encode_execute(position.position().id, position.action_address(), payload);
        TransactionIntent::new(label, self.bank.address(), data)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Supply and borrow into the position's pool.
    ///
    /// Balances are checked for every supplied token before anything is
    /// sent; approvals then go out one at a time in pool-token order, each
    /// confirmed before the next and before the bank call.
    pub async fn add_liquidity(
        &self,
        position: &BoundPosition,
        request: &AddLiquidityRequest,
    ) -> Result<TransactionReceipt, EngineError> {
        let pos = position.position();
        let tokens = &pos.pool.tokens;

        let mut supply = [U256::ZERO; 2];
        let mut borrow = [U256::ZERO; 2];
        for (i, token) in tokens.iter().enumerate() {
            supply[i] = decimal_to_u256(request.supply[i], token.decimals)?;
            borrow[i] = decimal_to_u256(request.borrow[i], token.decimals)?;
        }
        let supply_lp = decimal_to_u256(request.supply_lp, LP_DECIMALS)?;
        let borrow_lp = decimal_to_u256(request.borrow_lp, LP_DECIMALS)?;

        let sender = self.sender_for(position, "add liquidity")?;
        let owner = sender.owner();

        for (token, amount) in tokens.iter().zip(supply) {
            if amount.is_zero() {
                continue;
            }
            let available = self.balance_of(token.address, owner).await?;
            if available < amount {
                return Err(EngineError::InsufficientBalance {
                    symbol: token.symbol.clone(),
                    required: amount.to_string(),
                    available: available.to_string(),
                });
            }
        }

        for (token, amount) in tokens.iter().zip(supply) {
            if amount.is_zero() {
                continue;
            }
            let approve = IERC20::approveCall {
                spender: self.bank.address(),
                amount,
            };
            let receipt = sender
                .send(TransactionIntent::new(
                    format!("approve {}", token.symbol),
                    token.address,
                    Bytes::from(approve.abi_encode()),
                ))
                .await?;
            info!(token = %token.symbol, %amount, tx_hash = %receipt.tx_hash, "approval confirmed");
        }

        let info = self.bank.position_info(pos.id).await?;
        let decoded = position.decode_collateral(&info).await?;

        let params = AddLiquidity {
            token_a: tokens[0].address,
            token_b: tokens[1].address,
            supply_a: supply[0],
            supply_b: supply[1],
            supply_lp,
            borrow_a: borrow[0],
            borrow_b: borrow[1],
            borrow_lp,
            min_a: U256::ZERO,
            min_b: U256::ZERO,
            pool_index: decoded.pool_index,
        };
        let payload = position.adapter().encode_add_liquidity(&params);
        sender
            .send(self.execute_intent("add_liquidity", position, payload))
            .await
    }

    /// Take `pct` of the collateral out and repay the given fractions of
    /// each token's debt. A repay fraction of one repays the whole debt.
    pub async fn remove_liquidity(
        &self,
        position: &BoundPosition,
        pct: Decimal,
        repay_a: Decimal,
        repay_b: Decimal,
    ) -> Result<TransactionReceipt, EngineError> {
        if pct <= Decimal::ZERO || pct > Decimal::ONE {
            return Err(EngineError::invalid(format!(
                "withdraw fraction must be in (0, 1], got {pct}"
            )));
        }
        for f in [repay_a, repay_b] {
            if f < Decimal::ZERO || f > Decimal::ONE {
                return Err(EngineError::invalid(format!(
                    "repay fraction must be in [0, 1], got {f}"
                )));
            }
        }
        let sender = self.sender_for(position, "remove liquidity")?;

        let pos = position.position();
        let [token_a, token_b] = &pos.pool.tokens;
        let (info, debt_a, debt_b) = tokio::try_join!(
            self.bank.position_info(pos.id),
            self.bank.borrow_balance(pos.id, token_a.address),
            self.bank.borrow_balance(pos.id, token_b.address),
        )?;

        let params = RemoveLiquidity {
            token_a: token_a.address,
            token_b: token_b.address,
            lp_take: fraction_of(info.collateral_size, pct)?,
            lp_withdraw: U256::ZERO,
            repay_a: repay_fraction(debt_a, repay_a)?,
            repay_b: repay_fraction(debt_b, repay_b)?,
            repay_lp: RepayRequest::None,
            min_a: U256::ZERO,
            min_b: U256::ZERO,
        };
        let payload = position.adapter().encode_remove_liquidity(&params);
        sender
            .send(self.execute_intent("remove_liquidity", position, payload))
            .await
    }

    /// Withdraw all collateral and repay every outstanding debt.
    pub async fn close_position(&self, position: &BoundPosition) -> Result<TransactionReceipt, EngineError> {
        let sender = self.sender_for(position, "close position")?;

        let pos = position.position();
        let [token_a, token_b] = &pos.pool.tokens;
        let lp_debt = async {
            // The bank reverts for tokens it does not lend, LP tokens among them.
            match self.bank.borrow_balance(pos.id, pos.pool.lp_token).await {
                Ok(debt) => Ok::<_, EngineError>(debt),
                Err(e) => {
                    warn!(position_id = pos.id, lp = %pos.pool.lp_token, error = %e, "LP debt unreadable, assuming none");
                    Ok(U256::ZERO)
                }
            }
        };
        let (info, debt_a, debt_b, debt_lp) = tokio::try_join!(
            self.bank.position_info(pos.id),
            self.bank.borrow_balance(pos.id, token_a.address),
            self.bank.borrow_balance(pos.id, token_b.address),
            lp_debt,
        )?;

        let params = ClosePosition {
            token_a: token_a.address,
            token_b: token_b.address,
            collateral_size: info.collateral_size,
            debt_a,
            debt_b,
            debt_lp,
        };
        let payload = position.adapter().encode_close_position(&params);
        sender
            .send(self.execute_intent("close_position", position, payload))
            .await
    }

    /// Harvest rewards; `None` when nothing has accrued and no transaction
    /// was sent.
    pub async fn claim_rewards(
        &self,
        position: &BoundPosition,
    ) -> Result<Option<TransactionReceipt>, EngineError> {
        let sender = self.sender_for(position, "claim rewards")?;

        let reward = accrued_reward(&self.bank, position).await?;
        if reward.is_zero() {
            info!(position_id = position.position().id, "no rewards accrued, skipping claim");
            return Ok(None);
        }

        let payload = position.adapter().encode_claim_rewards();
        let receipt = sender
            .send(self.execute_intent("claim_rewards", position, payload))
            .await?;
        Ok(Some(receipt))
    }

    // -----------------------------------------------------------------------
    // Read-side helpers
    // -----------------------------------------------------------------------

    /// Split a bank transaction's input and name the spell action it runs.
    pub fn decode_transaction(
        &self,
        position: &BoundPosition,
        input: &[u8],
    ) -> Result<DecodedTransaction, EngineError> {
        let envelope = HomoraBank::decode_execute(input)?;
        let action = position.adapter().action_name(&envelope.inner);
        Ok(DecodedTransaction { envelope, action })
    }

    /// Balances of the pool's two tokens held by `holder`.
    pub async fn pool_token_balances(
        &self,
        position: &BoundPosition,
        holder: Address,
    ) -> Result<Vec<TokenBalance>, EngineError> {
        let [token_a, token_b] = &position.position().pool.tokens;
        let (a, b) = tokio::try_join!(
            self.token_balance(token_a, holder),
            self.token_balance(token_b, holder),
        )?;
        Ok(vec![a, b])
    }

    async fn token_balance(&self, token: &Token, holder: Address) -> Result<TokenBalance, EngineError> {
        let (raw, decimals) = tokio::try_join!(
            self.balance_of(token.address, holder),
            read(self.client.as_ref(), token.address, IERC20::decimalsCall {}),
        )?;
        if decimals != token.decimals {
            warn!(
                token = %token.symbol,
                configured = token.decimals,
                on_chain = decimals,
                "token decimals differ from reference table"
            );
        }
        Ok(TokenBalance {
            token: token.clone(),
            raw,
            amount: u256_to_decimal(raw, decimals)?,
        })
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, EngineError> {
        read(self.client.as_ref(), token, IERC20::balanceOfCall { owner }).await
    }
}

/// `floor(amount * fraction)`.
fn fraction_of(amount: U256, fraction: Decimal) -> Result<U256, EngineError> {
    let scaled = decimal_to_u256(fraction, FRACTION_DECIMALS)?;
    let one = U256::from(10u64).pow(U256::from(FRACTION_DECIMALS));
    amount
        .checked_mul(scaled)
        .map(|product| product / one)
        .ok_or_else(|| EngineError::Overflow(format!("{amount} * {fraction}")))
}

fn repay_fraction(debt: U256, fraction: Decimal) -> Result<RepayRequest, EngineError> {
    if fraction == Decimal::ONE {
        return Ok(repay_all(debt));
    }
    let amount = fraction_of(debt, fraction)?;
    Ok(if amount.is_zero() {
        RepayRequest::None
    } else {
        RepayRequest::Partial(amount)
    })
}

//! HomoraBank reads and the `execute` envelope.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use tracing::debug;

use crate::errors::EngineError;
use crate::execution::chain_client::{read, ChainClient};
use crate::execution::contracts::IHomoraBank;
use crate::types::{PositionDebt, PositionInfo};

/// Decoded outer call of a bank transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteEnvelope {
    pub position_id: U256,
    /// Spell the bank delegates to.
    pub spell: Address,
    /// Platform-encoded spell payload.
    pub inner: Bytes,
}

#[derive(Clone)]
pub struct HomoraBank {
    client: Arc<dyn ChainClient>,
    address: Address,
}

impl HomoraBank {
    pub fn new(client: Arc<dyn ChainClient>, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn position_info(&self, position_id: u64) -> Result<PositionInfo, EngineError> {
        let info = read(
            self.client.as_ref(),
            self.address,
            IHomoraBank::getPositionInfoCall {
                positionId: U256::from(position_id),
            },
        )
        .await?;
        debug!(
            position_id,
            coll_id = %info.collId,
            collateral_size = %info.collateralSize,
            "position info"
        );
        Ok(PositionInfo {
            owner: info.owner,
            collateral_token: info.collToken,
            collateral_id: info.collId,
            collateral_size: info.collateralSize,
        })
    }

    /// Debt of `token` including interest accrued up to the read block.
    pub async fn borrow_balance(&self, position_id: u64, token: Address) -> Result<U256, EngineError> {
        read(
            self.client.as_ref(),
            self.address,
            IHomoraBank::borrowBalanceCurrentCall {
                positionId: U256::from(position_id),
                token,
            },
        )
        .await
    }

    /// Collateral value in native-asset wei, as the bank credits it.
    pub async fn collateral_credit(&self, position_id: u64) -> Result<U256, EngineError> {
        read(
            self.client.as_ref(),
            self.address,
            IHomoraBank::getCollateralETHValueCall {
                positionId: U256::from(position_id),
            },
        )
        .await
    }

    /// Debt value in native-asset wei, as the bank credits it.
    pub async fn borrow_credit(&self, position_id: u64) -> Result<U256, EngineError> {
        read(
            self.client.as_ref(),
            self.address,
            IHomoraBank::getBorrowETHValueCall {
                positionId: U256::from(position_id),
            },
        )
        .await
    }

    /// Every token the position owes, with raw amounts.
    pub async fn position_debts(&self, position_id: u64) -> Result<Vec<PositionDebt>, EngineError> {
        let debts = read(
            self.client.as_ref(),
            self.address,
            IHomoraBank::getPositionDebtsCall {
                positionId: U256::from(position_id),
            },
        )
        .await?;
        if debts.tokens.len() != debts.debts.len() {
            return Err(EngineError::Decode {
                call: IHomoraBank::getPositionDebtsCall::SIGNATURE,
                reason: format!(
                    "{} tokens but {} amounts",
                    debts.tokens.len(),
                    debts.debts.len()
                ),
            });
        }
        Ok(debts
            .tokens
            .into_iter()
            .zip(debts.debts)
            .map(|(token, amount)| PositionDebt { token, amount })
            .collect())
    }

    /// `execute(positionId, spell, inner)` calldata.
    pub fn encode_execute(position_id: u64, spell: Address, inner: Bytes) -> Bytes {
        let call = IHomoraBank::executeCall {
            positionId: U256::from(position_id),
            spell,
            data: inner,
        };
        Bytes::from(call.abi_encode())
    }

    /// Split a bank transaction's input into its envelope fields.
    pub fn decode_execute(input: &[u8]) -> Result<ExecuteEnvelope, EngineError> {
        let call = IHomoraBank::executeCall::abi_decode(input).map_err(|e| EngineError::Decode {
            call: IHomoraBank::executeCall::SIGNATURE,
            reason: e.to_string(),
        })?;
        Ok(ExecuteEnvelope {
            position_id: call.positionId,
            spell: call.spell,
            inner: call.data,
        })
    }
}

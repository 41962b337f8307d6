use alloy::primitives::{Address, Bytes, B256};
use serde::Serialize;
use std::fmt;

/// An unsent, fully-parameterized call. Ephemeral: only the receipt
/// outlives a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    /// Short action name for logs, e.g. `"approve"` or `"close"`.
    pub label: String,
    pub to: Address,
    pub data: Bytes,
}

impl TransactionIntent {
    pub fn new(label: impl Into<String>, to: Address, data: Bytes) -> Self {
        Self {
            label: label.into(),
            to,
            data,
        }
    }
}

/// Lifecycle of a single mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStage {
    Intent,
    Signed,
    Submitted,
    Confirmed,
    Reverted,
}

impl TxStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intent => "intent",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Reverted => "reverted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Reverted)
    }
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Finalized on-chain record of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionReceipt {
    pub tx_hash: B256,
    pub block_hash: Option<B256>,
    pub block_number: Option<u64>,
    pub transaction_index: Option<u64>,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub status: TxStatus,
    pub logs: Vec<ReceiptLog>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == TxStatus::Success
    }

    /// Logs emitted by `emitter`, in receipt order.
    pub fn logs_from(&self, emitter: Address) -> impl Iterator<Item = &ReceiptLog> {
        self.logs.iter().filter(move |log| log.address == emitter)
    }
}

impl From<&alloy::rpc::types::TransactionReceipt> for TransactionReceipt {
    fn from(receipt: &alloy::rpc::types::TransactionReceipt) -> Self {
        let logs = receipt
            .inner
            .logs()
            .iter()
            .map(|log| ReceiptLog {
                address: log.address(),
                topics: log.topics().to_vec(),
                data: log.data().data.clone(),
            })
            .collect();

        Self {
            tx_hash: receipt.transaction_hash,
            block_hash: receipt.block_hash,
            block_number: receipt.block_number,
            transaction_index: receipt.transaction_index,
            from: receipt.from,
            to: receipt.to,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            status: if receipt.status() {
                TxStatus::Success
            } else {
                TxStatus::Reverted
            },
            logs,
        }
    }
}

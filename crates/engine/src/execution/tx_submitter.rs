//! Transaction submitter: simulation, local signing, nonce ordering and
//! confirmation.
//!
//! A mutation moves through `Intent -> Signed -> Submitted -> Confirmed |
//! Reverted`; every transition is logged with the intent label. Nothing is
//! retried once submitted.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::BlockId;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::{Panic, Revert, SolError};
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::TransactionTiming;
use crate::errors::EngineError;
use crate::execution::chain_client::HttpProvider;
use crate::types::{TransactionIntent, TransactionReceipt, TxStage};

/// Signs and submits intents for one owner, returning confirmed receipts.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Account the intents are sent from.
    fn owner(&self) -> Address;

    /// Run one intent to a terminal stage.
    ///
    /// A confirmed-but-reverted transaction is [`EngineError::TxReverted`];
    /// failures before broadcast are reported without sending anything.
    async fn send(&self, intent: TransactionIntent) -> Result<TransactionReceipt, EngineError>;
}

// ---------------------------------------------------------------------------
// TxSubmitter
// ---------------------------------------------------------------------------

pub struct TxSubmitter {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    /// Next nonce; `None` until first read from chain or after a failed
    /// broadcast. Held from nonce assignment through broadcast.
    nonce: Mutex<Option<u64>>,
    simulation_timeout: Duration,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    chain_id: u64,
}

impl TxSubmitter {
    pub fn new(
        provider: HttpProvider,
        signer: PrivateKeySigner,
        timing: &TransactionTiming,
        chain_id: u64,
    ) -> Self {
        info!(
            address = %signer.address(),
            chain_id,
            simulation_timeout = timing.simulation_timeout_seconds,
            confirmation_timeout = timing.confirmation_timeout_seconds,
            "TxSubmitter initialized"
        );

        Self {
            provider,
            signer,
            nonce: Mutex::new(None),
            simulation_timeout: Duration::from_secs(timing.simulation_timeout_seconds),
            confirmation_timeout: Duration::from_secs(timing.confirmation_timeout_seconds),
            poll_interval: Duration::from_millis(timing.receipt_poll_interval_ms),
            chain_id,
        }
    }

    fn request(&self, intent: &TransactionIntent) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.signer.address())
            .with_to(intent.to)
            .with_input(intent.data.clone())
    }

    /// `eth_call` the request at the latest block, under the simulation
    /// deadline.
    pub async fn simulate(&self, tx: &TransactionRequest) -> Result<Bytes, EngineError> {
        let provider = &self.provider;
        let tx = tx.clone();
        match tokio::time::timeout(self.simulation_timeout, async move { provider.call(tx).await })
            .await
        {
            Ok(Ok(output)) => {
                debug!(output_len = output.len(), "simulation succeeded");
                Ok(output)
            }
            Ok(Err(e)) => Err(EngineError::SimulationFailed {
                reason: revert_reason_of(&e),
            }),
            Err(_) => Err(EngineError::SimulationFailed {
                reason: format!(
                    "simulation timed out after {}s",
                    self.simulation_timeout.as_secs()
                ),
            }),
        }
    }

    /// Assign a nonce, sign and broadcast. The nonce lock is held until
    /// the node has accepted the raw transaction.
    async fn sign_and_broadcast(&self, intent: &TransactionIntent) -> Result<B256, EngineError> {
        let mut nonce_guard = self.nonce.lock().await;
        let nonce = match *nonce_guard {
            Some(n) => n,
            None => {
                let n = self
                    .provider
                    .get_transaction_count(self.signer.address())
                    .await?;
                info!(nonce = n, "nonce initialized from chain");
                n
            }
        };

        let request = self.request(intent);
        let gas_limit = self
            .provider
            .estimate_gas(request)
            .await
            .map_err(|e| EngineError::SimulationFailed {
                reason: format!("gas estimation failed: {}", revert_reason_of(&e)),
            })?;
        let gas_price = self.provider.get_gas_price().await?;

        let tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(intent.to),
            value: U256::ZERO,
            input: intent.data.clone(),
        };
        let sig = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| EngineError::SigningFailed {
                reason: e.to_string(),
            })?;
        let raw = TxEnvelope::Legacy(tx.into_signed(sig)).encoded_2718();
        log_stage(intent, TxStage::Signed);

        match self.provider.send_raw_transaction(&raw).await {
            Ok(pending) => {
                *nonce_guard = Some(nonce + 1);
                let tx_hash = *pending.tx_hash();
                info!(
                    label = %intent.label,
                    stage = %TxStage::Submitted,
                    tx_hash = %tx_hash,
                    nonce,
                    gas_price,
                    gas_limit,
                    "transaction stage"
                );
                Ok(tx_hash)
            }
            Err(e) => {
                // The node's view of the nonce is authoritative after a
                // rejected broadcast.
                *nonce_guard = None;
                Err(EngineError::Transport(e))
            }
        }
    }

    /// Poll until the receipt appears or the confirmation deadline passes.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<alloy::rpc::types::TransactionReceipt, EngineError> {
        let start = tokio::time::Instant::now();

        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, tx_hash = %tx_hash, "receipt poll error, retrying");
                }
            }

            if start.elapsed() >= self.confirmation_timeout {
                return Err(EngineError::TxTimeout {
                    tx_hash: tx_hash.to_string(),
                    timeout_seconds: self.confirmation_timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Re-run a reverted transaction at its block to recover the reason.
    async fn replay_revert_reason(&self, intent: &TransactionIntent, block: Option<u64>) -> String {
        let block = block.map(BlockId::number).unwrap_or_else(BlockId::latest);
        match self.provider.call(self.request(intent)).block(block).await {
            Err(e) => revert_reason_of(&e),
            Ok(_) => "transaction reverted on-chain".into(),
        }
    }

    /// Decode a Solidity revert payload: `Error(string)`, `Panic(uint256)`,
    /// or hex for anything else.
    pub fn decode_revert_reason(data: &[u8]) -> String {
        if data.is_empty() {
            return "Unknown revert".into();
        }
        if let Ok(revert) = Revert::abi_decode(data) {
            return revert.reason;
        }
        if let Ok(panic) = Panic::abi_decode(data) {
            return panic_message(panic.code);
        }
        hex::encode(data)
    }
}

#[async_trait]
impl TransactionSender for TxSubmitter {
    fn owner(&self) -> Address {
        self.signer.address()
    }

    async fn send(&self, intent: TransactionIntent) -> Result<TransactionReceipt, EngineError> {
        log_stage(&intent, TxStage::Intent);
        self.simulate(&self.request(&intent)).await?;

        let tx_hash = self.sign_and_broadcast(&intent).await?;
        let receipt = self.wait_for_receipt(tx_hash).await?;
        let receipt = TransactionReceipt::from(&receipt);

        if !receipt.succeeded() {
            let reason = self.replay_revert_reason(&intent, receipt.block_number).await;
            warn!(
                label = %intent.label,
                stage = %TxStage::Reverted,
                tx_hash = %tx_hash,
                reason = %reason,
                "transaction stage"
            );
            return Err(EngineError::TxReverted {
                tx_hash: tx_hash.to_string(),
                reason,
            });
        }

        info!(
            label = %intent.label,
            stage = %TxStage::Confirmed,
            tx_hash = %tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "transaction stage"
        );
        Ok(receipt)
    }
}

fn log_stage(intent: &TransactionIntent, stage: TxStage) {
    info!(label = %intent.label, stage = %stage, to = %intent.to, "transaction stage");
}

/// Revert reason carried by an RPC error, falling back to its message.
fn revert_reason_of(e: &TransportError) -> String {
    e.as_error_resp()
        .and_then(|payload| payload.as_revert_data())
        .map(|data| TxSubmitter::decode_revert_reason(&data))
        .unwrap_or_else(|| e.to_string())
}

fn panic_message(code: U256) -> String {
    let known = match code.saturating_to::<u64>() {
        0x01 => "assertion failed",
        0x11 => "arithmetic overflow/underflow",
        0x12 => "division by zero",
        0x21 => "enum conversion out of range",
        0x22 => "incorrectly encoded storage byte array",
        0x31 => "pop on empty array",
        0x32 => "array index out of bounds",
        0x41 => "too much memory allocated",
        0x51 => "called zero-initialized function pointer",
        _ => return format!("Panic(0x{code:x})"),
    };
    format!("Panic: {known}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

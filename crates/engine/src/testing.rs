//! In-crate test doubles: a scripted chain, a recording transaction sender
//! and canned external feeds.

use alloy::primitives::{Address, Bytes, B256};
use alloy::sol_types::SolCall;
use alloy::transports::TransportErrorKind;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::api::borrow_rates::BorrowRateFeed;
use crate::api::homora::{ApyFeed, ProtocolApi};
use crate::errors::EngineError;
use crate::execution::chain_client::ChainClient;
use crate::execution::tx_submitter::TransactionSender;
use crate::oracle::price_index::PriceIndex;
use crate::types::listing::{ApyListing, BorrowRate, PoolListing, PositionListing};
use crate::types::{
    PlatformAddresses, Pool, Position, Token, TransactionIntent, TransactionReceipt, TxStatus,
    WrapperKind,
};

// ---------------------------------------------------------------------------
// MockChain
// ---------------------------------------------------------------------------

enum Scripted {
    Return(Bytes),
    Revert(String),
}

#[derive(Default)]
struct ChainState {
    responses: HashMap<(Address, Bytes), Scripted>,
    calls: usize,
}

/// Chain client answering from a script keyed on `(to, calldata)`.
///
/// Clones share the script and call counter. Unscripted calls fail with
/// [`EngineError::DataUnavailable`].
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond<C: SolCall>(&self, to: Address, call: C, output: Vec<u8>) {
        self.respond_raw(to, call, Bytes::from(output));
    }

    pub fn respond_raw<C: SolCall>(&self, to: Address, call: C, output: Bytes) {
        let key = (to, Bytes::from(call.abi_encode()));
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(key, Scripted::Return(output));
    }

    pub fn revert<C: SolCall>(&self, to: Address, call: C, reason: &str) {
        let key = (to, Bytes::from(call.abi_encode()));
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(key, Scripted::Revert(reason.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        match state.responses.get(&(to, input.clone())) {
            Some(Scripted::Return(output)) => Ok(output.clone()),
            Some(Scripted::Revert(reason)) => Err(EngineError::Transport(
                TransportErrorKind::custom_str(&format!("execution reverted: {reason}")),
            )),
            None => Err(EngineError::unavailable(
                format!("mock eth_call {to}"),
                format!("no response scripted for 0x{}", hex::encode(&input)),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSender
// ---------------------------------------------------------------------------

/// Records every intent it is asked to send, in order.
///
/// Sends are serialized like a real per-owner submitter; `max_in_flight`
/// stays at 1 unless a caller overlaps them.
#[derive(Clone)]
pub struct MockSender {
    owner: Address,
    sent: Arc<Mutex<Vec<TransactionIntent>>>,
    revert_label: Option<String>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockSender {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            sent: Arc::default(),
            revert_label: None,
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
        }
    }

    /// Intents with this label come back reverted.
    pub fn reverting(mut self, label: &str) -> Self {
        self.revert_label = Some(label.to_string());
        self
    }

    pub fn sent(&self) -> Vec<TransactionIntent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.sent().into_iter().map(|i| i.label).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSender for MockSender {
    fn owner(&self) -> Address {
        self.owner
    }

    async fn send(&self, intent: TransactionIntent) -> Result<TransactionReceipt, EngineError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let index = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(intent.clone());
            sent.len()
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let tx_hash = B256::with_last_byte(index as u8);
        if self.revert_label.as_deref() == Some(intent.label.as_str()) {
            return Err(EngineError::TxReverted {
                tx_hash: tx_hash.to_string(),
                reason: "mock revert".into(),
            });
        }
        Ok(TransactionReceipt {
            tx_hash,
            block_hash: Some(B256::repeat_byte(0xbb)),
            block_number: Some(1_000 + index as u64),
            transaction_index: Some(0),
            from: self.owner,
            to: Some(intent.to),
            gas_used: 150_000,
            effective_gas_price: 25_000_000_000,
            status: TxStatus::Success,
            logs: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockPriceIndex {
    prices: HashMap<String, Decimal>,
}

impl MockPriceIndex {
    pub fn with(mut self, asset_id: &str, usd: Decimal) -> Self {
        self.prices.insert(asset_id.to_string(), usd);
        self
    }
}

#[async_trait]
impl PriceIndex for MockPriceIndex {
    async fn usd_price(&self, asset_id: &str) -> Result<Decimal, EngineError> {
        self.prices
            .get(asset_id)
            .copied()
            .ok_or_else(|| EngineError::unavailable("mock price index", format!("unknown id {asset_id}")))
    }
}

#[derive(Default)]
pub struct MockProtocolApi {
    pub positions: Vec<PositionListing>,
    pub pools: Vec<PoolListing>,
}

#[async_trait]
impl ProtocolApi for MockProtocolApi {
    async fn positions(&self) -> Result<Vec<PositionListing>, EngineError> {
        Ok(self.positions.clone())
    }

    async fn pools(&self) -> Result<Vec<PoolListing>, EngineError> {
        Ok(self.pools.clone())
    }
}

/// `None` simulates an unreachable feed.
pub struct MockApyFeed(pub Option<ApyListing>);

#[async_trait]
impl ApyFeed for MockApyFeed {
    async fn apys(&self) -> Result<ApyListing, EngineError> {
        self.0
            .clone()
            .ok_or_else(|| EngineError::unavailable("mock apy feed", "offline"))
    }
}

/// `None` simulates an unreachable feed.
pub struct MockBorrowRates(pub Option<Vec<BorrowRate>>);

#[async_trait]
impl BorrowRateFeed for MockBorrowRates {
    async fn borrow_rates(&self) -> Result<Vec<BorrowRate>, EngineError> {
        self.0
            .clone()
            .ok_or_else(|| EngineError::unavailable("mock borrow rates", "offline"))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn sample_addresses() -> PlatformAddresses {
    PlatformAddresses {
        spell: Address::repeat_byte(0x5e),
        wrapper: Address::repeat_byte(0x3a),
        staking: Address::repeat_byte(0xc4),
    }
}

pub fn token(symbol: &str, byte: u8, decimals: u8, price_index_id: &str) -> Token {
    Token {
        address: Address::repeat_byte(byte),
        symbol: symbol.to_string(),
        decimals,
        price_index_id: price_index_id.to_string(),
    }
}

pub fn wavax() -> Token {
    token("WAVAX", 0xa1, 18, "avalanche-2")
}

pub fn usdc() -> Token {
    token("USDC.e", 0xa2, 6, "usd-coin")
}

/// WAVAX/USDC.e position #42 in a pool of the given wrapper kind.
pub fn sample_position(kind: WrapperKind) -> Position {
    let reward_token = match kind {
        WrapperKind::MiniChefPng => token("PNG", 0xa3, 18, "pangolin"),
        _ => token("JOE", 0xa4, 18, "joe"),
    };
    Position {
        id: 42,
        owner: Address::repeat_byte(0x0e),
        pool: Pool {
            key: format!("{}-WAVAX/USDC.e", kind.as_str()),
            name: "WAVAX/USDC.e".into(),
            wrapper: kind,
            tokens: [wavax(), usdc()],
            lp_token: Address::repeat_byte(0x1b),
            contracts: sample_addresses(),
            reward_token,
            spell_override: None,
        },
    }
}

//! Read-only chain access behind an injectable trait.
//!
//! Every contract read in the engine goes through [`ChainClient::call`], so a
//! single mock can stand in for the node in tests and every read carries the
//! same deadline in production.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::errors::EngineError;

/// Concrete provider type: Alloy HTTP provider over Ethereum network.
pub type HttpProvider = RootProvider;

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `eth_call` of raw calldata against `to` at the latest block.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, EngineError>;
}

/// Encode `call`, run it against `to`, and decode its return value.
pub async fn read<C>(client: &dyn ChainClient, to: Address, call: C) -> Result<C::Return, EngineError>
where
    C: SolCall + Send,
{
    let input = Bytes::from(call.abi_encode());
    let output = client.call(to, input).await?;
    C::abi_decode_returns(&output).map_err(|e| EngineError::Decode {
        call: C::SIGNATURE,
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// RpcChainClient
// ---------------------------------------------------------------------------

/// [`ChainClient`] over an HTTP JSON-RPC provider with a per-read deadline.
///
/// A read that exceeds the deadline is reported as
/// [`EngineError::ReadTimeout`], never as an empty result.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: HttpProvider,
    read_timeout: Duration,
}

impl RpcChainClient {
    pub fn new(provider: HttpProvider, read_timeout: Duration) -> Self {
        Self {
            provider,
            read_timeout,
        }
    }

    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, EngineError> {
        let selector = input.get(..4).map(hex::encode).unwrap_or_default();
        let tx = TransactionRequest::default().with_to(to).with_input(input);
        let provider = &self.provider;

        match tokio::time::timeout(self.read_timeout, async move { provider.call(tx).await }).await
        {
            Ok(Ok(output)) => {
                debug!(%to, selector, output_len = output.len(), "eth_call");
                Ok(output)
            }
            Ok(Err(e)) => Err(EngineError::Transport(e)),
            Err(_) => Err(EngineError::ReadTimeout {
                name: format!("eth_call {to} 0x{selector}"),
                timeout_ms: self.read_timeout.as_millis() as u64,
            }),
        }
    }
}

//! Money-market borrow rates used to price the position's debt.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::http::{build_client, get_json};
use crate::errors::EngineError;
use crate::types::listing::{BorrowRate, BorrowRatesResponse};

#[async_trait]
pub trait BorrowRateFeed: Send + Sync {
    async fn borrow_rates(&self) -> Result<Vec<BorrowRate>, EngineError>;
}

/// Cream Finance `rates?comptroller=<network>`.
pub struct CreamRatesClient {
    http: Client,
    base_url: String,
    network: String,
}

impl CreamRatesClient {
    pub fn new(base_url: &str, network: &str, timeout: Duration) -> Result<Self, EngineError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            network: network.to_string(),
        })
    }
}

#[async_trait]
impl BorrowRateFeed for CreamRatesClient {
    async fn borrow_rates(&self) -> Result<Vec<BorrowRate>, EngineError> {
        let url = format!("{}/rates", self.base_url);
        let resp: BorrowRatesResponse = get_json(
            &self.http,
            "borrow rates",
            &url,
            &[("comptroller", self.network.as_str())],
        )
        .await?;
        Ok(resp.borrow_rates)
    }
}

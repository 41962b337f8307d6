//! External USD price index.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

use crate::api::http::{build_client, get_json};
use crate::errors::EngineError;

#[async_trait]
pub trait PriceIndex: Send + Sync {
    /// USD price of the asset with this index identifier. Unknown
    /// identifiers are an error, never zero.
    async fn usd_price(&self, asset_id: &str) -> Result<Decimal, EngineError>;
}

/// CoinGecko `simple/price` endpoint.
pub struct CoinGeckoIndex {
    http: Client,
    base_url: String,
}

impl CoinGeckoIndex {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceIndex for CoinGeckoIndex {
    async fn usd_price(&self, asset_id: &str) -> Result<Decimal, EngineError> {
        let url = format!("{}/simple/price", self.base_url);
        let prices: HashMap<String, HashMap<String, Decimal>> = get_json(
            &self.http,
            "price index",
            &url,
            &[("ids", asset_id), ("vs_currencies", "usd")],
        )
        .await?;

        prices
            .get(asset_id)
            .and_then(|quote| quote.get("usd"))
            .copied()
            .ok_or_else(|| {
                EngineError::unavailable("price index", format!("no USD price for '{asset_id}'"))
            })
    }
}

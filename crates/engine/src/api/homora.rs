//! Protocol REST API: position and pool listings, pool APYs.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::http::{build_client, get_json};
use crate::errors::EngineError;
use crate::types::listing::{ApyListing, PoolApy, PoolListing, PositionListing};

/// Position and pool listings of one chain deployment.
#[async_trait]
pub trait ProtocolApi: Send + Sync {
    async fn positions(&self) -> Result<Vec<PositionListing>, EngineError>;

    async fn pools(&self) -> Result<Vec<PoolListing>, EngineError>;
}

/// Unleveraged APYs keyed by pool key.
#[async_trait]
pub trait ApyFeed: Send + Sync {
    async fn apys(&self) -> Result<ApyListing, EngineError>;

    /// APYs of one pool; a pool missing from the listing is unavailable data.
    async fn pool_apy(&self, pool_key: &str) -> Result<PoolApy, EngineError> {
        self.apys()
            .await?
            .remove(pool_key)
            .ok_or_else(|| EngineError::unavailable("pool APYs", format!("no APY for pool {pool_key}")))
    }
}

pub struct HomoraApiClient {
    http: Client,
    /// Chain-scoped base, e.g. `https://api.homora.alphaventuredao.io/v2/43114`.
    base_url: String,
}

impl HomoraApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl ProtocolApi for HomoraApiClient {
    async fn positions(&self) -> Result<Vec<PositionListing>, EngineError> {
        get_json(&self.http, "position listing", &self.url("positions"), &[]).await
    }

    async fn pools(&self) -> Result<Vec<PoolListing>, EngineError> {
        get_json(&self.http, "pool listing", &self.url("pools"), &[]).await
    }
}

#[async_trait]
impl ApyFeed for HomoraApiClient {
    async fn apys(&self) -> Result<ApyListing, EngineError> {
        get_json(&self.http, "pool APYs", &self.url("apys"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> HomoraApiClient {
        HomoraApiClient::new(&format!("{}/v2/43114/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_positions_and_pools() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/43114/positions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "11575", "owner": "0xabc", "pool": {"key": "tj-usdt-dai"}, "collateralSize": "1000"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/43114/pools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "key": "tj-usdt-dai",
                "name": "USDT.e/DAI.e",
                "exchange": {"name": "Trader Joe", "reward": {"tokenName": "JOE"}},
                "tokens": ["0xc7198437980c041c805A1EDcbA50c1Ce5db95118", "0xd586E7F844cEa2F87f50152665BCbc2C279D8d70"],
                "lpTokenAddress": "0xa6908C7E3Be8F4Cd2eB704B5cB73583eBF56Ee62",
                "wTokenType": "WMasterChefJoeV2"
            }])))
            .mount(&server)
            .await;

        let api = client_for(&server).await;
        let positions = api.positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].id, 11575);
        assert_eq!(positions[0].pool.key, "tj-usdt-dai");

        let pools = api.pools().await.unwrap();
        assert_eq!(pools[0].w_token_type, "WMasterChefJoeV2");
        assert_eq!(
            pools[0].exchange.reward.as_ref().map(|r| r.symbol.as_str()),
            Some("JOE")
        );
    }

    #[tokio::test]
    async fn test_pool_apy_by_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/43114/apys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tj-usdt-dai": {"tradingFeeAPY": "0.05", "farmingAPY": 0.1, "totalAPY": "0.15"}
            })))
            .mount(&server)
            .await;

        let api = client_for(&server).await;
        let apy = api.pool_apy("tj-usdt-dai").await.unwrap();
        assert_eq!(apy.trading_fee_apy, dec!(0.05));
        assert_eq!(apy.farming_apy, dec!(0.1));

        let err = api.pool_apy("unknown").await.unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.pools().await.unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }), "{err}");
    }
}

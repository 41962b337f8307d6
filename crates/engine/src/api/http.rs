use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::EngineError;

pub(crate) fn build_client(timeout: Duration) -> Result<Client, EngineError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// GET `url` and parse the JSON body.
///
/// Transport failures, non-success statuses and unparsable bodies are all
/// unavailable data for the named feed.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    feed: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<T, EngineError> {
    let resp = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| EngineError::unavailable(feed, format!("GET {url}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(feed, %status, url, body = %body, "feed returned error status");
        return Err(EngineError::unavailable(feed, format!("HTTP {status} from {url}")));
    }

    let parsed = resp
        .json::<T>()
        .await
        .map_err(|e| EngineError::unavailable(feed, format!("parse JSON from {url}: {e}")))?;
    debug!(feed, url, "feed response");
    Ok(parsed)
}

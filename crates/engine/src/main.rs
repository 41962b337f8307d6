use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::RootProvider;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, Result};
use tracing::{info, warn};

use lyf_engine::api::{CreamRatesClient, HomoraApiClient};
use lyf_engine::config;
use lyf_engine::core::{PlatformDirectory, PositionResolver, PositionValuer};
use lyf_engine::execution::{
    ChainClient, HomoraBank, RpcChainClient, TransactionComposer, TransactionSender, TxSubmitter,
};
use lyf_engine::logging;
use lyf_engine::oracle::{CoinGeckoIndex, PriceOracle};
use lyf_engine::platforms::BoundPosition;
use lyf_engine::types::TokenRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("ENGINE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        chain_id = config.chain.chain_id,
        chain_name = %config.chain.chain_name,
        tokens = config.tokens.len(),
        "position engine starting"
    );

    // -----------------------------------------------------------------------
    // Chain access
    // -----------------------------------------------------------------------

    let rpc_url: Url = config
        .chain
        .rpc
        .http_url
        .parse()
        .context("failed to parse RPC URL")?;
    let provider = RootProvider::new_http(rpc_url);
    let client: Arc<dyn ChainClient> = Arc::new(RpcChainClient::new(
        provider.clone(),
        Duration::from_secs(config.timing.read_timeout_seconds),
    ));

    let contracts = &config.chain.contracts;
    let bank_address: Address = contracts
        .homora_bank
        .parse()
        .context("failed to parse homora_bank address")?;
    let aggregate_oracle: Address = contracts
        .aggregate_oracle
        .parse()
        .context("failed to parse aggregate_oracle address")?;
    let safe_oracle: Option<Address> = if contracts.safe_oracle.is_empty() {
        None
    } else {
        Some(
            contracts
                .safe_oracle
                .parse()
                .context("failed to parse safe_oracle address")?,
        )
    };

    // -----------------------------------------------------------------------
    // Component construction
    // -----------------------------------------------------------------------

    let tokens = TokenRegistry::from_config(&config.tokens, &config.chain.native_symbol)?;
    let request_timeout = Duration::from_secs(config.apis.request_timeout_seconds);

    let index = Arc::new(CoinGeckoIndex::new(
        &config.apis.price_index_base_url,
        request_timeout,
    )?);
    let oracle = Arc::new(PriceOracle::on_chain(
        client.clone(),
        safe_oracle,
        aggregate_oracle,
        index,
        tokens.native().clone(),
    ));

    let homora_api = Arc::new(HomoraApiClient::new(
        &config.apis.homora_base_url,
        request_timeout,
    )?);
    let borrow_rates = Arc::new(CreamRatesClient::new(
        &config.apis.borrow_rates_base_url,
        &config.apis.borrow_rate_network,
        request_timeout,
    )?);

    let bank = HomoraBank::new(client.clone(), bank_address);
    let resolver = PositionResolver::new(
        homora_api.clone(),
        tokens,
        PlatformDirectory::from_config(&config.chain.platforms)?,
        client.clone(),
        bank.clone(),
    );
    let valuer = PositionValuer::new(
        bank.clone(),
        oracle,
        homora_api,
        borrow_rates,
        config.apis.bank_fee_multiplier,
    );

    let sender = init_sender(provider, &config)?;
    let composer = TransactionComposer::new(client, bank, sender.clone());

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    let owner = match env_nonempty("OWNER_ADDRESS") {
        Some(addr) => addr.parse::<Address>().context("failed to parse OWNER_ADDRESS")?,
        None => match &sender {
            Some(sender) => sender.owner(),
            None => anyhow::bail!("OWNER_ADDRESS or OWNER_PRIVATE_KEY is required"),
        },
    };

    let positions = match env_nonempty("POSITION_ID") {
        Some(id) => {
            let id: u64 = id.parse().context("failed to parse POSITION_ID")?;
            vec![resolver
                .resolve(id, owner)
                .await
                .with_context(|| format!("failed to resolve position {id}"))?]
        }
        None => resolver
            .positions_by_owner(owner)
            .await
            .context("failed to resolve owner positions")?,
    };

    let claim = env_nonempty("CLAIM_REWARDS").is_some_and(|v| v == "true" || v == "1");
    for position in &positions {
        report(&valuer, position).await?;

        if claim {
            match composer.claim_rewards(position).await? {
                Some(receipt) => info!(
                    position_id = position.position().id,
                    tx_hash = %receipt.tx_hash,
                    "rewards claimed"
                ),
                None => info!(position_id = position.position().id, "nothing to claim"),
            }
        }
    }

    info!(positions = positions.len(), "done");
    Ok(())
}

/// Log value, ratios, rewards and APY of one position.
async fn report(valuer: &PositionValuer, position: &BoundPosition) -> Result<()> {
    let id = position.position().id;
    let snapshot = valuer
        .position_value(position)
        .await
        .with_context(|| format!("failed to value position {id}"))?;
    let leverage = snapshot
        .leverage()
        .with_context(|| format!("failed to compute leverage of position {id}"))?;
    let debt_ratio = valuer.debt_ratio(position).await?;
    let debts = valuer.debts(position).await?;
    let rewards = valuer.rewards_outstanding(position).await?;

    info!(
        position_id = id,
        pool = %position.position().pool.key,
        equity_usd = %snapshot.equity_usd,
        debt_usd = %snapshot.debt_usd,
        position_usd = %snapshot.position_usd,
        %leverage,
        %debt_ratio,
        debt_tokens = debts.len(),
        reward = %rewards.amount,
        reward_token = %rewards.token.symbol,
        reward_usd = %rewards.value_usd,
        "position"
    );

    // APY feed outages are logged, not fatal.
    match valuer.current_apy(position).await {
        Ok(apy) => info!(
            position_id = id,
            total = %apy.total,
            trading_fee = %apy.trading_fee,
            farming = %apy.farming,
            borrow = %apy.borrow,
            "current APY"
        ),
        Err(e) => warn!(position_id = id, error = %e, "APY unavailable"),
    }
    Ok(())
}

/// Submitter for `OWNER_PRIVATE_KEY`; `None` leaves the engine read-only.
fn init_sender(
    provider: RootProvider,
    config: &config::EngineConfig,
) -> Result<Option<Arc<dyn TransactionSender>>> {
    let Some(key) = env_nonempty("OWNER_PRIVATE_KEY") else {
        info!("no OWNER_PRIVATE_KEY set, mutations disabled");
        return Ok(None);
    };
    let key = key.strip_prefix("0x").unwrap_or(&key);
    let signer: PrivateKeySigner = key
        .parse()
        .context("failed to parse OWNER_PRIVATE_KEY")?;

    Ok(Some(Arc::new(TxSubmitter::new(
        provider,
        signer,
        &config.timing.transaction,
        config.chain.chain_id,
    ))))
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

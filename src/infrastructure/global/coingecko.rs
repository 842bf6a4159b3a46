use crate::domain::macro_pulse::GlobalMarket;
use crate::domain::ports::GlobalMarketProvider;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, ensure_success};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    total_market_cap: HashMap<String, f64>,
    market_cap_percentage: HashMap<String, f64>,
    market_cap_change_percentage_24h_usd: f64,
}

/// CoinGecko `/global` endpoint: BTC dominance and total capitalisation.
pub struct CoinGeckoGlobalProvider {
    client: ClientWithMiddleware,
    url: String,
}

impl CoinGeckoGlobalProvider {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            url,
        }
    }
}

fn into_domain(data: GlobalData) -> Result<GlobalMarket> {
    Ok(GlobalMarket {
        btc_dominance: *data
            .market_cap_percentage
            .get("btc")
            .context("BTC dominance missing from global data")?,
        total_market_cap_usd: *data
            .total_market_cap
            .get("usd")
            .context("USD market cap missing from global data")?,
        market_cap_change_24h_pct: data.market_cap_change_percentage_24h_usd,
    })
}

#[async_trait]
impl GlobalMarketProvider for CoinGeckoGlobalProvider {
    async fn fetch_global(&self) -> Result<GlobalMarket> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to fetch CoinGecko global data")?;
        let response = ensure_success(response, "CoinGecko").await?;

        let body: GlobalResponse = response
            .json()
            .await
            .context("Failed to parse CoinGecko global response")?;
        into_domain(body.data)
    }
}

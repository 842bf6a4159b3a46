//! Binance Market Data Service
//!
//! Provides the public REST endpoints the pipeline needs:
//! - Tradable pair discovery (exchangeInfo)
//! - 24h ticker statistics, all pairs or a batched subset
//! - Historical candle data (klines)
//! - Connectivity ping

use crate::domain::errors::MarketDataError;
use crate::domain::ports::ExchangeClient;
use crate::domain::trading::types::{Candle, Ticker24h};
use crate::infrastructure::core::http_client_factory::{
    DEFAULT_MAX_RETRIES, HttpClientFactory, build_url_with_query, ensure_success,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SOURCE: &str = "Binance";

pub struct BinanceMarketDataService {
    client: ClientWithMiddleware,
    ping_client: ClientWithMiddleware,
    base_url: String,
}

impl BinanceMarketDataService {
    pub fn builder() -> BinanceMarketDataServiceBuilder {
        BinanceMarketDataServiceBuilder::default()
    }
}

#[derive(Default)]
pub struct BinanceMarketDataServiceBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    ping_timeout: Option<Duration>,
    max_retries: Option<u32>,
}

impl BinanceMarketDataServiceBuilder {
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = Some(timeout);
        self
    }

    /// Transient retries for data calls. The ping never retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn build(self) -> BinanceMarketDataService {
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.binance.com".to_string());
        let timeout = self.timeout.unwrap_or(Duration::from_secs(8));
        let ping_timeout = self.ping_timeout.unwrap_or(Duration::from_secs(5));

        BinanceMarketDataService {
            client: HttpClientFactory::create_client_with_retries(
                timeout,
                self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            ),
            // A ping must reflect a single attempt; retries would hide outages.
            ping_client: HttpClientFactory::create_client_with_retries(ping_timeout, 0),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Ticker24hr {
    symbol: String,
    #[serde(rename = "priceChangePercent")]
    price_change_percent: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
    #[serde(rename = "lastPrice")]
    last_price: String,
}

impl Ticker24hr {
    fn into_domain(self) -> Option<Ticker24h> {
        Some(Ticker24h {
            last_price: self.last_price.parse().ok()?,
            price_change_percent: self.price_change_percent.parse().ok()?,
            quote_volume: self.quote_volume.parse().ok()?,
            symbol: self.symbol,
        })
    }
}

/// Binance klines format: `[openTime, open, high, low, close, volume, ...]`
fn parse_kline(k: &serde_json::Value) -> Option<Candle> {
    let arr = k.as_array()?;
    if arr.len() < 6 {
        return None;
    }
    let num = |i: usize| arr[i].as_str()?.parse::<f64>().ok();

    Some(Candle {
        open_time: arr[0].as_i64()?,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
        volume: num(5)?,
    })
}

impl BinanceMarketDataService {
    async fn get_tickers(&self, url: &str) -> Result<Vec<Ticker24h>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch 24hr ticker from Binance")?;
        let response = ensure_success(response, SOURCE).await?;

        let tickers: Vec<Ticker24hr> = response
            .json()
            .await
            .context("Failed to parse Binance 24hr ticker response")?;

        Ok(tickers.into_iter().filter_map(Ticker24hr::into_domain).collect())
    }
}

#[async_trait]
impl ExchangeClient for BinanceMarketDataService {
    async fn trading_pairs(&self, quote: &str) -> Result<Vec<String>> {
        #[derive(Debug, Deserialize)]
        struct SymbolInfo {
            symbol: String,
            status: String,
            #[serde(rename = "quoteAsset")]
            quote_asset: String,
        }

        #[derive(Debug, Deserialize)]
        struct ExchangeInfo {
            symbols: Vec<SymbolInfo>,
        }

        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch exchangeInfo from Binance")?;
        let response = ensure_success(response, SOURCE).await?;

        let info: ExchangeInfo = response
            .json()
            .await
            .context("Failed to parse Binance exchangeInfo")?;

        let pairs: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset == quote)
            .map(|s| s.symbol)
            .collect();

        debug!("Binance: {} tradable {} pairs", pairs.len(), quote);
        Ok(pairs)
    }

    async fn all_tickers(&self) -> Result<Vec<Ticker24h>> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        self.get_tickers(&url).await
    }

    async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker24h>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        // Binance accepts a JSON array: symbols=["BTCUSDT","ETHUSDT"]
        let symbols_json = serde_json::to_string(symbols)?;
        let url = build_url_with_query(
            &format!("{}/api/v3/ticker/24hr", self.base_url),
            &[("symbols", symbols_json.as_str())],
        )?;
        self.get_tickers(&url).await
    }

    async fn klines(&self, symbol: &str, interval: &str, limit: u16) -> Result<Vec<Candle>> {
        let limit_str = limit.to_string();
        let url = build_url_with_query(
            &format!("{}/api/v3/klines", self.base_url),
            &[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", limit_str.as_str()),
            ],
        )?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch klines for {}", symbol))?;
        let response = ensure_success(response, SOURCE).await?;

        let klines: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Failed to parse Binance klines response")?;

        let candles: Vec<Candle> = klines.iter().filter_map(parse_kline).collect();
        if candles.len() != klines.len() {
            return Err(MarketDataError::InvalidData {
                symbol: symbol.to_string(),
                reason: format!("{} malformed klines", klines.len() - candles.len()),
            }
            .into());
        }

        debug!("Binance: fetched {} bars for {}", candles.len(), symbol);
        Ok(candles)
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/v3/ping", self.base_url);
        let response = self
            .ping_client
            .get(&url)
            .send()
            .await
            .context("Binance ping failed")?;
        ensure_success(response, SOURCE).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kline() {
        let raw = json!([1700000000000i64, "100.5", "110.0", "99.0", "105.25", "1234.5", 1700014399999i64]);
        let candle = parse_kline(&raw).unwrap();
        assert_eq!(candle.open_time, 1700000000000);
        assert_eq!(candle.close, 105.25);
        assert_eq!(candle.volume, 1234.5);
    }

    #[test]
    fn test_parse_kline_rejects_short_rows() {
        assert!(parse_kline(&json!([1, "1", "2"])).is_none());
        assert!(parse_kline(&json!({"open": 1})).is_none());
    }

    #[test]
    fn test_ticker_conversion() {
        let raw: Ticker24hr = serde_json::from_value(json!({
            "symbol": "BTCUSDT",
            "priceChangePercent": "-2.500",
            "quoteVolume": "1500000000.12",
            "lastPrice": "64000.01",
            "openPrice": "65641.00"
        }))
        .unwrap();
        let ticker = raw.into_domain().unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.price_change_percent, -2.5);
        assert!(ticker.quote_volume > 1.4e9);
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let service = BinanceMarketDataService::builder()
            .base_url("https://api.binance.com/".to_string())
            .build();
        assert_eq!(service.base_url, "https://api.binance.com");
    }
}

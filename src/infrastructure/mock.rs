//! In-memory port implementations for driving agents without a network.

use crate::domain::macro_pulse::GlobalMarket;
use crate::domain::ports::{ExchangeClient, FeedSource, GlobalMarketProvider, TradeBoard};
use crate::domain::sentiment::{FearGreedReading, SentimentProvider};
use crate::domain::trading::types::{ActiveTrade, Candle, Ticker24h};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockExchange {
    pairs: Vec<String>,
    tickers: Vec<Ticker24h>,
    klines: HashMap<String, Vec<Candle>>,
    ping_ok: bool,
    tickers_fail: bool,
    kline_calls: AtomicUsize,
    requested_tickers: Mutex<Vec<String>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self {
            ping_ok: true,
            ..Default::default()
        }
    }

    pub fn with_pair(mut self, symbol: &str) -> Self {
        self.pairs.push(symbol.to_string());
        self
    }

    pub fn with_ticker(mut self, symbol: &str, last_price: f64, change_pct: f64, quote_volume: f64) -> Self {
        self.tickers.push(Ticker24h {
            symbol: symbol.to_string(),
            last_price,
            price_change_percent: change_pct,
            quote_volume,
        });
        self
    }

    pub fn with_klines(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.klines.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_ping(mut self, ok: bool) -> Self {
        self.ping_ok = ok;
        self
    }

    pub fn with_failing_tickers(mut self) -> Self {
        self.tickers_fail = true;
        self
    }

    pub fn kline_calls(&self) -> usize {
        self.kline_calls.load(Ordering::SeqCst)
    }

    pub fn requested_tickers(&self) -> Vec<String> {
        self.requested_tickers
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    async fn trading_pairs(&self, quote: &str) -> Result<Vec<String>> {
        Ok(self.pairs.iter().filter(|p| p.ends_with(quote)).cloned().collect())
    }

    async fn all_tickers(&self) -> Result<Vec<Ticker24h>> {
        if self.tickers_fail {
            bail!("mock ticker outage");
        }
        Ok(self.tickers.clone())
    }

    async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker24h>> {
        if let Ok(mut requested) = self.requested_tickers.lock() {
            requested.extend(symbols.iter().cloned());
        }
        if self.tickers_fail {
            bail!("mock ticker outage");
        }
        Ok(self
            .tickers
            .iter()
            .filter(|t| symbols.contains(&t.symbol))
            .cloned()
            .collect())
    }

    async fn klines(&self, symbol: &str, _interval: &str, _limit: u16) -> Result<Vec<Candle>> {
        self.kline_calls.fetch_add(1, Ordering::SeqCst);
        self.klines
            .get(symbol)
            .cloned()
            .ok_or_else(|| anyhow!("no klines for {}", symbol))
    }

    async fn ping(&self) -> Result<()> {
        if self.ping_ok {
            Ok(())
        } else {
            bail!("mock ping failure")
        }
    }
}

/// Returns the configured reading, or an error when none is set.
#[derive(Default)]
pub struct MockSentimentProvider {
    pub reading: Option<FearGreedReading>,
}

#[async_trait]
impl SentimentProvider for MockSentimentProvider {
    async fn fetch_fear_greed(&self) -> Result<FearGreedReading> {
        self.reading.clone().ok_or_else(|| anyhow!("sentiment unavailable"))
    }
}

#[derive(Default)]
pub struct MockGlobalMarket {
    pub global: Option<GlobalMarket>,
}

#[async_trait]
impl GlobalMarketProvider for MockGlobalMarket {
    async fn fetch_global(&self) -> Result<GlobalMarket> {
        self.global.clone().ok_or_else(|| anyhow!("global data unavailable"))
    }
}

/// Serves fixed bodies by URL; unknown URLs fail like an unreachable feed.
#[derive(Default)]
pub struct MockFeedSource {
    bodies: HashMap<String, String>,
}

impl MockFeedSource {
    pub fn with_feed(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    async fn fetch_raw(&self, url: &str) -> Result<String> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("feed {} unreachable", url))
    }
}

/// `None` simulates a board outage.
#[derive(Default)]
pub struct MockTradeBoard {
    pub trades: Option<Vec<ActiveTrade>>,
}

#[async_trait]
impl TradeBoard for MockTradeBoard {
    async fn active_trades(&self) -> Result<Vec<ActiveTrade>> {
        self.trades.clone().ok_or_else(|| anyhow!("trade board unavailable"))
    }
}

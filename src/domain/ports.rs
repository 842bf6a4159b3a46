use crate::domain::macro_pulse::GlobalMarket;
use crate::domain::news::FeedItem;
use crate::domain::trading::types::{ActiveTrade, Candle, Ticker24h};
use anyhow::Result;
use async_trait::async_trait;

/// Public market-data endpoints of the exchange.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Symbols currently trading against `quote`.
    async fn trading_pairs(&self, quote: &str) -> Result<Vec<String>>;
    /// 24h statistics for every pair on the exchange.
    async fn all_tickers(&self) -> Result<Vec<Ticker24h>>;
    /// 24h statistics for the given pairs, in one batched request.
    async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker24h>>;
    async fn klines(&self, symbol: &str, interval: &str, limit: u16) -> Result<Vec<Candle>>;
    /// Lightweight connectivity check.
    async fn ping(&self) -> Result<()>;
}

/// Global crypto market aggregates (dominance, total capitalisation).
#[async_trait]
pub trait GlobalMarketProvider: Send + Sync {
    async fn fetch_global(&self) -> Result<GlobalMarket>;
}

/// Raw text retrieval for RSS/Atom feeds.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_raw(&self, url: &str) -> Result<String>;
}

/// Turns raw feed markup into items. Never fails; unparseable blocks are skipped.
pub trait FeedItemExtractor: Send + Sync {
    fn extract(&self, raw_markup: &str) -> Vec<FeedItem>;
}

/// External trading board holding the currently open positions.
#[async_trait]
pub trait TradeBoard: Send + Sync {
    async fn active_trades(&self) -> Result<Vec<ActiveTrade>>;
}

//! Position Sentinel: short-window adverse-move surveillance of held trades.

use crate::application::runner::{Launch, RunOutcome};
use crate::config::Config;
use crate::config::storage_config::{SENTINEL_ALERTS_FILE, SENTINEL_PRICES_FILE};
use crate::domain::errors::CredentialError;
use crate::domain::ports::{ExchangeClient, TradeBoard};
use crate::domain::sentinel::{
    HISTORY_WINDOW_MS, PriceHistoryBook, SentinelAlertSnapshot, SentinelLevel, evaluate_position,
};
use crate::infrastructure::binance::BinanceMarketDataService;
use crate::infrastructure::persistence::{JsonFileStore, read_credential};
use crate::infrastructure::trade_board::HttpTradeBoard;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const WORKER: &str = "position_sentinel";
pub const STALE_LOCK_AFTER: Duration = Duration::from_secs(10 * 60);

pub struct PositionSentinel {
    board: Arc<dyn TradeBoard>,
    exchange: Arc<dyn ExchangeClient>,
    store: JsonFileStore,
}

impl PositionSentinel {
    pub fn new(board: Arc<dyn TradeBoard>, exchange: Arc<dyn ExchangeClient>, store: JsonFileStore) -> Self {
        Self {
            board,
            exchange,
            store,
        }
    }

    /// Fails when the board API key cannot be read.
    pub fn from_config(config: &Config) -> Result<Self, CredentialError> {
        let api_key = read_credential(
            &config.storage.credentials_file,
            &config.sentinel.api_key_name,
        )?;
        let timeout = config.upstream.http_timeout;
        let board = HttpTradeBoard::new(
            &config.upstream.trade_board.base_url,
            &config.upstream.trade_board.board_id,
            api_key,
            timeout,
        );
        let exchange = BinanceMarketDataService::builder()
            .base_url(config.upstream.binance.base_url.clone())
            .timeout(timeout)
            .max_retries(0)
            .build();
        Ok(Self::new(
            Arc::new(board),
            Arc::new(exchange),
            JsonFileStore::new(config.storage.state_dir()),
        ))
    }

    /// Skips the cycle when no credential is available, before any state
    /// is touched.
    pub fn prepare(config: &Config) -> Launch<Self> {
        match Self::from_config(config) {
            Ok(sentinel) => Launch::Run(sentinel),
            Err(e) => Launch::Skip(e.to_string()),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let trades = self
            .board
            .active_trades()
            .await
            .context("Failed to fetch active trades")?;
        if trades.is_empty() {
            return Ok(RunOutcome::skipped("no active trades"));
        }

        let symbols: BTreeSet<String> = trades.iter().map(|t| t.symbol.clone()).collect();
        let symbol_list: Vec<String> = symbols.iter().cloned().collect();
        let tickers = self
            .exchange
            .tickers(&symbol_list)
            .await
            .context("Failed to fetch tickers for held symbols")?;
        let tickers: HashMap<&str, _> = tickers.iter().map(|t| (t.symbol.as_str(), t)).collect();

        let now_ms = now.timestamp_millis();
        let mut book: PriceHistoryBook = self.store.load_or_default(SENTINEL_PRICES_FILE);
        book.retain(|symbol, _| symbols.contains(symbol));
        for symbol in &symbols {
            let Some(ticker) = tickers.get(symbol.as_str()) else {
                debug!("Sentinel: no ticker for {}", symbol);
                continue;
            };
            let log = book.entry(symbol.clone()).or_default();
            log.push(ticker.last_price, now_ms);
            log.prune(now_ms, HISTORY_WINDOW_MS);
        }

        let mut alerts = Vec::new();
        for trade in &trades {
            if let (Some(ticker), Some(log)) = (tickers.get(trade.symbol.as_str()), book.get(&trade.symbol)) {
                alerts.extend(evaluate_position(trade, ticker, log, now_ms));
            }
        }

        self.store
            .save(SENTINEL_PRICES_FILE, &book)
            .context("Failed to write sentinel price history")?;

        if alerts.is_empty() {
            return Ok(RunOutcome::completed(format!(
                "{} position(s) checked, no alerts",
                trades.len()
            )));
        }

        for alert in &alerts {
            match alert.level {
                SentinelLevel::Danger => warn!("{}", alert.message),
                _ => info!("{}", alert.message),
            }
        }
        let count = alerts.len();
        self.store
            .save(
                SENTINEL_ALERTS_FILE,
                &SentinelAlertSnapshot {
                    timestamp: now,
                    alerts,
                },
            )
            .context("Failed to write sentinel alerts")?;

        Ok(RunOutcome::completed(format!(
            "{} position(s) checked, {} alert(s)",
            trades.len(),
            count
        )))
    }
}

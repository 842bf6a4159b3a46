//! Opportunity Scanner: scores every liquid pair and publishes a ranked watchlist.

use crate::application::runner::RunOutcome;
use crate::config::storage_config::WATCHLIST_FILE;
use crate::config::{Config, ScannerEnvConfig};
use crate::domain::opportunity::watchlist::{WATCHLIST_MAX_LEN, WATCHLIST_TOP_N};
use crate::domain::opportunity::{
    CoinMetrics, CoinScore, WatchlistSnapshot, assemble_watchlist, score_coin,
};
use crate::domain::ports::ExchangeClient;
use crate::domain::trading::types::base_asset;
use crate::infrastructure::binance::BinanceMarketDataService;
use crate::infrastructure::persistence::JsonFileStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const WORKER: &str = "scanner";
pub const STALE_LOCK_AFTER: Duration = Duration::from_secs(45 * 60);

/// A pair selected for candle fetching.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    pub volume_24h: f64,
    pub is_core: bool,
    pub is_hedge: bool,
}

pub struct OpportunityScanner {
    exchange: Arc<dyn ExchangeClient>,
    store: JsonFileStore,
    config: ScannerEnvConfig,
}

impl OpportunityScanner {
    pub fn new(exchange: Arc<dyn ExchangeClient>, store: JsonFileStore, config: ScannerEnvConfig) -> Self {
        Self {
            exchange,
            store,
            config,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let exchange = BinanceMarketDataService::builder()
            .base_url(config.upstream.binance.base_url.clone())
            .timeout(config.upstream.http_timeout)
            .build();
        Self::new(
            Arc::new(exchange),
            JsonFileStore::new(config.storage.state_dir()),
            config.scanner.clone(),
        )
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let candidates = self.select_candidates().await?;
        let scores = self.score_candidates(&candidates).await;
        if scores.is_empty() {
            return Ok(RunOutcome::skipped("no pair produced a score"));
        }

        let scored = scores.len();
        let watchlist = assemble_watchlist(scores, WATCHLIST_TOP_N, WATCHLIST_MAX_LEN);
        let snapshot = WatchlistSnapshot {
            timestamp: now,
            scanned: scored,
            count: watchlist.len(),
            watchlist,
        };
        self.store
            .save(WATCHLIST_FILE, &snapshot)
            .context("Failed to write watchlist")?;

        Ok(RunOutcome::completed(format!(
            "{} of {} candidates scored, {} on watchlist",
            scored,
            candidates.len(),
            snapshot.count
        )))
    }

    /// Tradable quote pairs minus stablecoins and illiquid pairs, with the
    /// core and hedge symbols always included.
    pub async fn select_candidates(&self) -> Result<Vec<Candidate>> {
        let cfg = &self.config;
        let (pairs, tickers) = tokio::try_join!(
            self.exchange.trading_pairs(&cfg.quote_asset),
            self.exchange.all_tickers()
        )
        .context("Failed to list tradable pairs")?;

        let pairs: HashSet<String> = pairs.into_iter().collect();
        let stablecoins: HashSet<&str> = cfg.stablecoins.iter().map(String::as_str).collect();
        let volumes: HashMap<&str, f64> = tickers
            .iter()
            .map(|t| (t.symbol.as_str(), t.quote_volume))
            .collect();

        let is_core = |s: &str| cfg.core_symbols.iter().any(|c| c == s);
        let is_hedge = |s: &str| cfg.hedge_symbol == s;

        let mut pinned: Vec<Candidate> = cfg
            .core_symbols
            .iter()
            .chain(std::iter::once(&cfg.hedge_symbol))
            .map(|symbol| Candidate {
                symbol: symbol.clone(),
                volume_24h: volumes.get(symbol.as_str()).copied().unwrap_or(0.0),
                is_core: is_core(symbol),
                is_hedge: is_hedge(symbol),
            })
            .collect();

        let mut liquid: Vec<Candidate> = tickers
            .iter()
            .filter(|t| pairs.contains(&t.symbol))
            .filter(|t| !is_core(&t.symbol) && !is_hedge(&t.symbol))
            .filter(|t| {
                base_asset(&t.symbol, &cfg.quote_asset).is_some_and(|b| !stablecoins.contains(b))
            })
            .filter(|t| t.quote_volume >= cfg.min_volume_usd)
            .map(|t| Candidate {
                symbol: t.symbol.clone(),
                volume_24h: t.quote_volume,
                is_core: false,
                is_hedge: false,
            })
            .collect();
        liquid.sort_by(|a, b| b.volume_24h.total_cmp(&a.volume_24h));

        pinned.append(&mut liquid);
        debug!("Scanner: {} candidates from {} pairs", pinned.len(), pairs.len());
        Ok(pinned)
    }

    /// Fetches candles pair by pair with a fixed delay; failing pairs are skipped.
    async fn score_candidates(&self, candidates: &[Candidate]) -> Vec<CoinScore> {
        let mut scores = Vec::with_capacity(candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            if i > 0 && !self.config.pair_delay.is_zero() {
                tokio::time::sleep(self.config.pair_delay).await;
            }

            let candles = match self
                .exchange
                .klines(&candidate.symbol, &self.config.interval, self.config.candle_limit)
                .await
            {
                Ok(candles) => candles,
                Err(e) => {
                    debug!("Scanner: skipping {}: {:#}", candidate.symbol, e);
                    continue;
                }
            };

            match CoinMetrics::from_candles(&candidate.symbol, candidate.volume_24h, &candles) {
                Ok(metrics) => {
                    let score = score_coin(&metrics, candidate.is_core, candidate.is_hedge);
                    debug!("Scanner: {} scored {} ({})", score.symbol, score.score, score.reason);
                    scores.push(score);
                }
                Err(e) => debug!("Scanner: skipping {}: {}", candidate.symbol, e),
            }
        }
        if let Some(best) = scores.iter().filter(|s| !s.is_core && !s.is_hedge).max_by_key(|s| s.score) {
            debug!("Scanner: top opportunity {} ({})", best.symbol, best.score);
        }
        scores
    }
}

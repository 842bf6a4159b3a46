//! Macro Pulse Monitor: sentiment, dominance, safe-haven flows and macro headlines.

use crate::application::runner::RunOutcome;
use crate::config::storage_config::{MACRO_HISTORY_FILE, MACRO_SNAPSHOT_FILE};
use crate::config::{Config, FeedConfig, MacroEnvConfig};
use crate::domain::macro_pulse::{
    MacroHistory, MacroSnapshot, NewsFlag, PRICE_LOG_WINDOW_MS, evaluate_fear_greed,
    evaluate_global, evaluate_safe_haven, recent_flags,
};
use crate::domain::news::KeywordMatcher;
use crate::domain::ports::{ExchangeClient, FeedItemExtractor, FeedSource, GlobalMarketProvider};
use crate::domain::sentiment::SentimentProvider;
use crate::infrastructure::binance::BinanceMarketDataService;
use crate::infrastructure::global::CoinGeckoGlobalProvider;
use crate::infrastructure::news::{HttpFeedSource, PatternFeedExtractor};
use crate::infrastructure::persistence::JsonFileStore;
use crate::infrastructure::sentiment::AlternativeMeSentimentProvider;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const WORKER: &str = "macro_pulse";
pub const STALE_LOCK_AFTER: Duration = Duration::from_secs(10 * 60);

/// Upstream collaborators of the monitor.
pub struct MacroSources {
    pub sentiment: Arc<dyn SentimentProvider>,
    pub global: Arc<dyn GlobalMarketProvider>,
    pub exchange: Arc<dyn ExchangeClient>,
    pub feeds: Arc<dyn FeedSource>,
    pub extractor: Arc<dyn FeedItemExtractor>,
}

pub struct MacroPulseMonitor {
    sources: MacroSources,
    store: JsonFileStore,
    config: MacroEnvConfig,
    matcher: KeywordMatcher,
}

impl MacroPulseMonitor {
    pub fn new(sources: MacroSources, store: JsonFileStore, config: MacroEnvConfig) -> Result<Self> {
        let matcher = KeywordMatcher::new(&config.keywords).context("Invalid macro keyword")?;
        Ok(Self {
            sources,
            store,
            config,
            matcher,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.upstream.http_timeout;
        let exchange = BinanceMarketDataService::builder()
            .base_url(config.upstream.binance.base_url.clone())
            .timeout(timeout)
            .build();
        let sources = MacroSources {
            sentiment: Arc::new(AlternativeMeSentimentProvider::new(
                config.upstream.data_sources.fear_greed_url.clone(),
                timeout,
            )),
            global: Arc::new(CoinGeckoGlobalProvider::new(
                config.upstream.data_sources.global_market_url.clone(),
                timeout,
            )),
            exchange: Arc::new(exchange),
            feeds: Arc::new(HttpFeedSource::new(timeout)),
            extractor: Arc::new(PatternFeedExtractor::new().context("Invalid feed pattern")?),
        };
        Self::new(
            sources,
            JsonFileStore::new(config.storage.state_dir()),
            config.macro_pulse.clone(),
        )
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let now_ms = now.timestamp_millis();
        let mut history: MacroHistory = self.store.load_or_default(MACRO_HISTORY_FILE);
        let safe_haven_pair = [
            self.config.safe_haven_symbol.clone(),
            self.config.primary_symbol.clone(),
        ];

        let (sentiment, global, tickers, news_flags) = tokio::join!(
            self.sources.sentiment.fetch_fear_greed(),
            self.sources.global.fetch_global(),
            self.sources.exchange.tickers(&safe_haven_pair),
            self.scan_headlines(now),
        );

        let mut alerts = Vec::new();

        let fear_greed = match sentiment {
            Ok(reading) => {
                let (section, alert) = evaluate_fear_greed(&reading);
                alerts.extend(alert);
                Some(section)
            }
            Err(e) => {
                debug!("Macro: sentiment unavailable: {:#}", e);
                None
            }
        };

        let (btc_dominance, total_market_cap) = match global {
            Ok(global) => {
                let (dominance, market_cap, global_alerts) =
                    evaluate_global(&global, history.last_btc_dominance);
                alerts.extend(global_alerts);
                history.last_btc_dominance = Some(global.btc_dominance);
                (Some(dominance), Some(market_cap))
            }
            Err(e) => {
                debug!("Macro: global market data unavailable: {:#}", e);
                (None, None)
            }
        };

        let gold = match tickers {
            Ok(tickers) => {
                let find = |symbol: &str| tickers.iter().find(|t| t.symbol == symbol);
                let haven = find(&self.config.safe_haven_symbol);
                let primary = find(&self.config.primary_symbol);
                // Deltas are measured against the log as persisted by the previous run.
                let section = match (haven, primary) {
                    (Some(haven), Some(primary)) => {
                        let (section, alert) =
                            evaluate_safe_haven(haven, primary, &history.gold_prices, now_ms);
                        alerts.extend(alert);
                        Some(section)
                    }
                    _ => None,
                };
                if let Some(haven) = haven {
                    history.gold_prices.push(haven.last_price, now_ms);
                }
                section
            }
            Err(e) => {
                debug!("Macro: safe-haven tickers unavailable: {:#}", e);
                None
            }
        };
        history.gold_prices.prune(now_ms, PRICE_LOG_WINDOW_MS);

        let snapshot = MacroSnapshot {
            timestamp: now,
            fear_greed,
            btc_dominance,
            total_market_cap,
            gold,
            news_flags,
            alerts,
        };

        self.store
            .save(MACRO_HISTORY_FILE, &history)
            .context("Failed to write macro history")?;
        self.store
            .save(MACRO_SNAPSHOT_FILE, &snapshot)
            .context("Failed to write macro snapshot")?;

        for alert in &snapshot.alerts {
            info!("Macro alert [{:?}]: {}", alert.kind, alert.message);
        }

        Ok(RunOutcome::completed(format!(
            "{} alert(s), {} news flag(s)",
            snapshot.alerts.len(),
            snapshot.news_flags.len()
        )))
    }

    async fn scan_headlines(&self, now: DateTime<Utc>) -> Vec<NewsFlag> {
        let fetches = self
            .config
            .feeds
            .iter()
            .map(|feed| async move { (feed, self.sources.feeds.fetch_raw(&feed.url).await) });

        join_all(fetches)
            .await
            .into_iter()
            .flat_map(|(feed, result): (&FeedConfig, Result<String>)| match result {
                Ok(raw) => {
                    let items = self.sources.extractor.extract(&raw);
                    recent_flags(&items, &feed.name, &self.matcher, now, self.config.news_window)
                }
                Err(e) => {
                    debug!("Macro: feed {} skipped: {:#}", feed.name, e);
                    Vec::new()
                }
            })
            .collect()
    }
}

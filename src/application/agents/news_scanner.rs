//! News Scanner: keyword/severity classification of new headlines.

use crate::application::runner::RunOutcome;
use crate::config::storage_config::{NEWS_SEEN_FILE, NEWS_SNAPSHOT_FILE};
use crate::config::{Config, FeedConfig};
use crate::domain::market::rolling_window::SeenTitles;
use crate::domain::news::{KeywordMatcher, NewsScanSnapshot, Severity, SeverityClassifier, scan_items};
use crate::domain::ports::{FeedItemExtractor, FeedSource};
use crate::infrastructure::news::{HttpFeedSource, PatternFeedExtractor};
use crate::infrastructure::persistence::JsonFileStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const WORKER: &str = "news_scanner";
pub const STALE_LOCK_AFTER: Duration = Duration::from_secs(10 * 60);

pub struct NewsScanner {
    source: Arc<dyn FeedSource>,
    extractor: Arc<dyn FeedItemExtractor>,
    store: JsonFileStore,
    feeds: Vec<FeedConfig>,
    matcher: KeywordMatcher,
    severity: SeverityClassifier,
}

impl NewsScanner {
    pub fn new(
        source: Arc<dyn FeedSource>,
        extractor: Arc<dyn FeedItemExtractor>,
        store: JsonFileStore,
        feeds: Vec<FeedConfig>,
        keywords: &[String],
    ) -> Result<Self> {
        Ok(Self {
            source,
            extractor,
            store,
            feeds,
            matcher: KeywordMatcher::new(keywords).context("Invalid news keyword")?,
            severity: SeverityClassifier::new().context("Invalid severity pattern")?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            Arc::new(HttpFeedSource::new(config.upstream.http_timeout)),
            Arc::new(PatternFeedExtractor::new().context("Invalid feed pattern")?),
            JsonFileStore::new(config.storage.state_dir()),
            config.news.feeds.clone(),
            &config.news.keywords,
        )
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let mut seen: SeenTitles = self.store.load_or_default(NEWS_SEEN_FILE);

        let bodies = join_all(
            self.feeds
                .iter()
                .map(|feed| async move { (feed, self.source.fetch_raw(&feed.url).await) }),
        )
        .await;

        let mut articles = Vec::new();
        for (feed, body) in bodies {
            match body {
                Ok(raw) => {
                    let items = self.extractor.extract(&raw);
                    debug!("News: {} items from {}", items.len(), feed.name);
                    articles.extend(scan_items(&items, &feed.name, &mut seen, &self.matcher, &self.severity));
                }
                Err(e) => debug!("News: feed {} skipped: {:#}", feed.name, e),
            }
        }

        let snapshot = NewsScanSnapshot::new(now, articles);
        self.store
            .save(NEWS_SEEN_FILE, &seen)
            .context("Failed to write seen titles")?;
        self.store
            .save(NEWS_SNAPSHOT_FILE, &snapshot)
            .context("Failed to write news snapshot")?;

        if !snapshot.articles.is_empty() {
            info!("News: {}", snapshot.summary);
            for article in &snapshot.articles {
                match article.severity {
                    Severity::High => warn!("[{}] {} ({})", article.severity, article.title, article.source),
                    _ => info!("[{}] {} ({})", article.severity, article.title, article.source),
                }
            }
        }

        Ok(RunOutcome::completed(snapshot.summary))
    }
}

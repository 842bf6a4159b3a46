use chrono::Utc;
use market_pulse::application::agents::NewsScanner;
use market_pulse::config::FeedConfig;
use market_pulse::config::storage_config::{NEWS_SEEN_FILE, NEWS_SNAPSHOT_FILE};
use market_pulse::domain::news::{NewsScanSnapshot, Severity};
use market_pulse::infrastructure::mock::MockFeedSource;
use market_pulse::infrastructure::news::PatternFeedExtractor;
use market_pulse::infrastructure::persistence::JsonFileStore;
use std::sync::Arc;

const WIRE: &str = "https://wire.example.com/rss";
const BLOG: &str = "https://blog.example.com/atom";

const WIRE_BODY: &str = r#"<rss><channel>
<item><title>Bridge exploit drains $80M</title><pubDate>Tue, 11 Jun 2024 09:00:00 +0000</pubDate></item>
<item><title>SEC opens comment period on custody rule</title></item>
<item><title>Layer-2 fees hit record low</title></item>
<item><title>Bridge exploit drains $80M</title></item>
</channel></rss>"#;

const BLOG_BODY: &str = r#"<feed>
<entry><title>ETF inflows slow</title><published>2024-06-11T08:00:00Z</published></entry>
</feed>"#;

fn keywords() -> Vec<String> {
    ["hack", "exploit", "sec", "etf"].iter().map(|s| s.to_string()).collect()
}

fn scanner(store: &JsonFileStore, source: MockFeedSource) -> NewsScanner {
    NewsScanner::new(
        Arc::new(source),
        Arc::new(PatternFeedExtractor::new().unwrap()),
        store.clone(),
        vec![
            FeedConfig::parse(WIRE).unwrap(),
            FeedConfig::parse(BLOG).unwrap(),
            FeedConfig::parse("https://offline.example.com/rss").unwrap(),
        ],
        &keywords(),
    )
    .unwrap()
}

fn feeds() -> MockFeedSource {
    MockFeedSource::default()
        .with_feed(WIRE, WIRE_BODY)
        .with_feed(BLOG, BLOG_BODY)
}

#[tokio::test]
async fn test_first_run_classifies_and_dedups() {
    let tmp = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(tmp.path());

    scanner(&store, feeds()).run_at(Utc::now()).await.unwrap();

    let snapshot: NewsScanSnapshot = store.load(NEWS_SNAPSHOT_FILE).unwrap().unwrap();
    assert_eq!(snapshot.articles.len(), 3);
    assert_eq!(snapshot.high_risk_count, 1);
    assert_eq!(snapshot.summary, "3 new headline(s) matched, 1 high risk");

    let exploit = &snapshot.articles[0];
    assert_eq!(exploit.keyword, "exploit");
    assert_eq!(exploit.severity, Severity::High);
    assert_eq!(exploit.source, "wire.example.com");
    assert!(exploit.published_at.is_some());

    assert_eq!(snapshot.articles[1].severity, Severity::Medium);
    assert_eq!(snapshot.articles[2].keyword, "etf");
    assert_eq!(snapshot.articles[2].severity, Severity::Low);

    let seen: Vec<String> = store.load(NEWS_SEEN_FILE).unwrap().unwrap();
    assert_eq!(seen.len(), 4);
}

#[tokio::test]
async fn test_second_run_reports_nothing_new_but_refreshes_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(tmp.path());
    let first = Utc::now();
    scanner(&store, feeds()).run_at(first).await.unwrap();

    let second = first + chrono::Duration::minutes(10);
    let outcome = scanner(&store, feeds()).run_at(second).await.unwrap();
    assert!(outcome.is_completed());

    let snapshot: NewsScanSnapshot = store.load(NEWS_SNAPSHOT_FILE).unwrap().unwrap();
    assert!(snapshot.articles.is_empty());
    assert_eq!(snapshot.timestamp, second);
    assert_eq!(snapshot.summary, "0 new headline(s) matched, 0 high risk");
}

#[tokio::test]
async fn test_all_feeds_down_still_writes_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(tmp.path());
    scanner(&store, MockFeedSource::default()).run_at(Utc::now()).await.unwrap();

    let snapshot: NewsScanSnapshot = store.load(NEWS_SNAPSHOT_FILE).unwrap().unwrap();
    assert!(snapshot.articles.is_empty());
}

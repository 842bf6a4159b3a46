//! Headline keyword matching and severity classification.

use crate::domain::market::rolling_window::SeenTitles;
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry pulled out of an RSS/Atom feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

const HIGH_SEVERITY_PATTERN: &str = r"\b(hack|exploit|ban|crash|sanctions|lawsuit|war)\b";
const MEDIUM_SEVERITY_PATTERN: &str = r"\b(sec|regulation|fed|rates)\b";

const INFLECTION: &str = "(?:s|es|ed|ing)?";

/// Case-insensitive, first-match-wins keyword scanner.
///
/// Keywords match whole words with an optional inflection, so `hack`
/// matches "hacked" and `ban` matches "bans", but `ban` does not match
/// "bank" and `sec` does not match "second".
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, regex::Error> {
        let keywords = keywords
            .iter()
            .map(|k| {
                let k = k.as_ref().trim().to_lowercase();
                let re = RegexBuilder::new(&format!(r"\b{}{}\b", regex::escape(&k), INFLECTION))
                    .case_insensitive(true)
                    .build()?;
                Ok((k, re))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { keywords })
    }

    /// The first configured keyword found in `text`, in keyword-list order.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(k, _)| k.as_str())
    }
}

/// Two-tier severity regexes; anything else that matched a keyword is `low`.
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    high: Regex,
    medium: Regex,
}

impl SeverityClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            high: RegexBuilder::new(HIGH_SEVERITY_PATTERN).case_insensitive(true).build()?,
            medium: RegexBuilder::new(MEDIUM_SEVERITY_PATTERN).case_insensitive(true).build()?,
        })
    }

    pub fn classify(&self, keyword: &str) -> Severity {
        if self.high.is_match(keyword) {
            Severity::High
        } else if self.medium.is_match(keyword) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub keyword: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub severity: Severity,
}

/// News scanner output written to `news-scan.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsScanSnapshot {
    pub timestamp: DateTime<Utc>,
    pub articles: Vec<NewsArticle>,
    pub high_risk_count: usize,
    pub summary: String,
}

impl NewsScanSnapshot {
    pub fn new(timestamp: DateTime<Utc>, articles: Vec<NewsArticle>) -> Self {
        let high_risk_count = articles.iter().filter(|a| a.severity == Severity::High).count();
        let summary = format!(
            "{} new headline(s) matched, {} high risk",
            articles.len(),
            high_risk_count
        );
        Self {
            timestamp,
            articles,
            high_risk_count,
            summary,
        }
    }
}

/// Scans one feed's items against the seen set.
///
/// Every unseen title is recorded as seen, matched or not. Titles already
/// seen (in earlier runs or earlier in this run) are skipped.
pub fn scan_items(
    items: &[FeedItem],
    source: &str,
    seen: &mut SeenTitles,
    matcher: &KeywordMatcher,
    severity: &SeverityClassifier,
) -> Vec<NewsArticle> {
    let mut articles = Vec::new();
    for item in items {
        if !seen.insert(&item.title) {
            continue;
        }
        if let Some(keyword) = matcher.first_match(&item.title) {
            articles.push(NewsArticle {
                title: item.title.clone(),
                keyword: keyword.to_string(),
                source: source.to_string(),
                published_at: item.published_at,
                severity: severity.classify(keyword),
            });
        }
    }
    articles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: None,
            published_at: None,
        }
    }

    #[test]
    fn test_first_keyword_wins() {
        let matcher = KeywordMatcher::new(&["hack", "sec", "fed"]).unwrap();
        assert_eq!(matcher.first_match("SEC sues exchange after hack"), Some("hack"));
        assert_eq!(matcher.first_match("Fed holds rates"), Some("fed"));
        assert_eq!(matcher.first_match("Bitcoin climbs"), None);
    }

    #[test]
    fn test_keywords_match_whole_words_with_inflections() {
        let matcher = KeywordMatcher::new(&["ban", "war", "hack", "rate"]).unwrap();
        assert_eq!(matcher.first_match("Country BANS mining"), Some("ban"));
        assert_eq!(matcher.first_match("Exchange hacked overnight"), Some("hack"));
        assert_eq!(matcher.first_match("Trade war escalates"), Some("war"));
        assert_eq!(matcher.first_match("Urban miners rejoice"), None);
        assert_eq!(matcher.first_match("Software update"), None);
    }

    fn default_matcher() -> KeywordMatcher {
        KeywordMatcher::new(&[
            "hack", "exploit", "ban", "crash", "sanctions", "lawsuit", "war", "sec", "regulation",
            "fed", "rates", "etf", "delist", "liquidation", "bankrupt", "inflation",
        ])
        .unwrap()
    }

    #[test]
    fn test_longer_words_sharing_a_keyword_prefix_do_not_match() {
        let matcher = default_matcher();
        assert_eq!(matcher.first_match("Bank of Japan holds steady"), None);
        assert_eq!(matcher.first_match("Bitcoin posts second weekly gain"), None);
        assert_eq!(matcher.first_match("Analyst warns of thin liquidity"), None);
        assert_eq!(matcher.first_match("Exchange files for bankruptcy"), None);
    }

    #[test]
    fn test_bankrupt_is_reachable_behind_ban() {
        let matcher = default_matcher();
        let severity = SeverityClassifier::new().unwrap();
        let mut seen = SeenTitles::default();
        let items = vec![item("Crypto lender declared bankrupt")];

        let articles = scan_items(&items, "wire", &mut seen, &matcher, &severity);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].keyword, "bankrupt");
        assert_eq!(articles[0].severity, Severity::Low);
        assert_eq!(matcher.first_match("Regulators ban stablecoin"), Some("ban"));
    }

    #[test]
    fn test_severity_tiers() {
        let classifier = SeverityClassifier::new().unwrap();
        assert_eq!(classifier.classify("exploit"), Severity::High);
        assert_eq!(classifier.classify("sanctions"), Severity::High);
        assert_eq!(classifier.classify("SEC"), Severity::Medium);
        assert_eq!(classifier.classify("rates"), Severity::Medium);
        assert_eq!(classifier.classify("etf"), Severity::Low);
        assert_eq!(classifier.classify("bankrupt"), Severity::Low);
    }

    #[test]
    fn test_scan_marks_everything_seen_and_dedups() {
        let matcher = KeywordMatcher::new(&["hack"]).unwrap();
        let severity = SeverityClassifier::new().unwrap();
        let mut seen = SeenTitles::default();
        let items = vec![item("Exchange hacked"), item("Calm markets"), item("Exchange hacked")];

        let articles = scan_items(&items, "coindesk", &mut seen, &matcher, &severity);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].severity, Severity::High);
        assert!(seen.contains("Calm markets"));

        // Second pass over the same feed emits nothing new
        let again = scan_items(&items, "coindesk", &mut seen, &matcher, &severity);
        assert!(again.is_empty());
    }

    #[test]
    fn test_snapshot_summary() {
        let snapshot = NewsScanSnapshot::new(Utc::now(), vec![]);
        assert_eq!(snapshot.high_risk_count, 0);
        assert_eq!(snapshot.summary, "0 new headline(s) matched, 0 high risk");
    }
}

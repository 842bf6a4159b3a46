//! Configuration for the macro, news, sentinel and health workers.

use super::storage_config::{
    MACRO_SNAPSHOT_FILE, NEWS_SNAPSHOT_FILE, SENTINEL_ALERTS_FILE, WATCHLIST_FILE,
};
use crate::domain::health::ModuleSpec;
use anyhow::{Context, Result};
use std::env;
use url::Url;

const DEFAULT_FEEDS: &[&str] = &[
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
    "https://cointelegraph.com/rss",
    "https://decrypt.co/feed",
];

const MACRO_KEYWORDS: &[&str] = &[
    "war", "sanctions", "tariff", "fed", "rates", "inflation", "sec", "etf", "ban", "hack",
    "recession", "default",
];

const NEWS_KEYWORDS: &[&str] = &[
    "hack", "exploit", "ban", "crash", "sanctions", "lawsuit", "war", "sec", "regulation", "fed",
    "rates", "etf", "delist", "liquidation", "bankrupt", "inflation",
];

/// A named feed URL. The name is the URL host unless given explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl FeedConfig {
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (name, url) = match spec.split_once('=') {
            Some((name, url)) if !name.contains('/') => (Some(name.trim()), url.trim()),
            _ => (None, spec),
        };
        let parsed = Url::parse(url).with_context(|| format!("Invalid feed URL: {}", url))?;
        let name = match name {
            Some(n) => n.to_string(),
            None => parsed
                .host_str()
                .map(|h| h.trim_start_matches("www.").to_string())
                .unwrap_or_else(|| url.to_string()),
        };
        Ok(Self {
            name,
            url: url.to_string(),
        })
    }
}

fn feeds_from_env(key: &str) -> Result<Vec<FeedConfig>> {
    match env::var(key) {
        Ok(list) => list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(FeedConfig::parse)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Failed to parse {}", key)),
        Err(_) => DEFAULT_FEEDS.iter().map(|u| FeedConfig::parse(u)).collect(),
    }
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct MacroEnvConfig {
    pub feeds: Vec<FeedConfig>,
    pub keywords: Vec<String>,
    pub safe_haven_symbol: String,
    pub primary_symbol: String,
    pub news_window: chrono::Duration,
}

impl MacroEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            feeds: feeds_from_env("MACRO_FEEDS")?,
            keywords: owned(MACRO_KEYWORDS),
            safe_haven_symbol: "PAXGUSDT".to_string(),
            primary_symbol: "BTCUSDT".to_string(),
            news_window: chrono::Duration::hours(2),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewsEnvConfig {
    pub feeds: Vec<FeedConfig>,
    pub keywords: Vec<String>,
}

impl NewsEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            feeds: feeds_from_env("NEWS_FEEDS")?,
            keywords: owned(NEWS_KEYWORDS),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SentinelEnvConfig {
    pub api_key_name: String,
}

impl Default for SentinelEnvConfig {
    fn default() -> Self {
        Self {
            api_key_name: "TRADE_BOARD_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthEnvConfig {
    pub modules: Vec<ModuleSpec>,
}

impl Default for HealthEnvConfig {
    fn default() -> Self {
        let module = |name: &str, file: &str, max_age: i64, alert_only: bool| ModuleSpec {
            name: name.to_string(),
            file_name: file.to_string(),
            max_age_minutes: max_age,
            alert_only,
        };
        Self {
            modules: vec![
                module("scanner", WATCHLIST_FILE, 90, false),
                module("macro_pulse", MACRO_SNAPSHOT_FILE, 45, false),
                module("news_scanner", NEWS_SNAPSHOT_FILE, 20, false),
                module("position_sentinel", SENTINEL_ALERTS_FILE, 5, true),
            ],
        }
    }
}

//! Macro market state: sentiment, dominance, capitalisation, safe-haven
//! correlation and headline flags, plus the alert rules over them.

use crate::domain::market::rolling_window::{PriceLog, percent_change};
use crate::domain::news::{FeedItem, KeywordMatcher};
use crate::domain::sentiment::{FearGreedReading, SentimentClassification};
use crate::domain::trading::types::Ticker24h;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SENTIMENT_SHIFT_POINTS: i16 = 8;
pub const DOMINANCE_ALERT_POINTS: f64 = 1.0;
pub const DOMINANCE_TREND_POINTS: f64 = 0.3;
pub const MARKET_CAP_DROP_PCT: f64 = -5.0;
pub const SAFE_HAVEN_UP_PCT: f64 = 2.0;
pub const PRIMARY_DOWN_PCT: f64 = -2.0;

pub const PRICE_LOG_WINDOW_MS: i64 = 4 * 60 * 60 * 1000;
pub const LOOKBACK_1H_MS: i64 = 60 * 60 * 1000;
pub const LOOKBACK_4H_MS: i64 = 4 * 60 * 60 * 1000;
pub const LOOKBACK_TOLERANCE: f64 = 1.25;

/// Global aggregates as reported by the market-data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalMarket {
    pub btc_dominance: f64,
    pub total_market_cap_usd: f64,
    pub market_cap_change_24h_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroAlertKind {
    SentimentShift,
    DominanceRising,
    DominanceFalling,
    MarketCapDrop,
    FlightToSafety,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAlert {
    #[serde(rename = "type")]
    pub kind: MacroAlertKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominanceTrend {
    Rising,
    Falling,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FearGreedSection {
    pub value: u8,
    pub previous: Option<u8>,
    pub change_24h: Option<i16>,
    pub classification: SentimentClassification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DominanceSection {
    pub value: f64,
    pub previous: Option<f64>,
    pub change: Option<f64>,
    pub trend: DominanceTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCapSection {
    pub total_usd: f64,
    pub change_24h_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeHavenSection {
    pub symbol: String,
    pub price: f64,
    pub change_24h_pct: f64,
    pub change_1h_pct: Option<f64>,
    pub change_4h_pct: Option<f64>,
    pub primary_symbol: String,
    pub primary_change_24h_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFlag {
    pub title: String,
    pub keyword: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Macro monitor output written to `macro-pulse.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroSnapshot {
    pub timestamp: DateTime<Utc>,
    pub fear_greed: Option<FearGreedSection>,
    pub btc_dominance: Option<DominanceSection>,
    pub total_market_cap: Option<MarketCapSection>,
    pub gold: Option<SafeHavenSection>,
    pub news_flags: Vec<NewsFlag>,
    pub alerts: Vec<MacroAlert>,
}

/// Rolling state carried between macro runs in `macro-history.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MacroHistory {
    pub last_btc_dominance: Option<f64>,
    pub gold_prices: PriceLog,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn evaluate_fear_greed(reading: &FearGreedReading) -> (FearGreedSection, Option<MacroAlert>) {
    let change = reading.change_24h();
    let alert = change.filter(|c| c.abs() > SENTIMENT_SHIFT_POINTS).map(|c| MacroAlert {
        kind: MacroAlertKind::SentimentShift,
        message: format!(
            "Fear & Greed moved {:+} points in 24h to {} ({})",
            c, reading.value, reading.classification
        ),
    });

    let section = FearGreedSection {
        value: reading.value,
        previous: reading.previous,
        change_24h: change,
        classification: reading.classification,
    };
    (section, alert)
}

pub fn dominance_trend(change: Option<f64>) -> DominanceTrend {
    match change {
        None => DominanceTrend::Unknown,
        Some(c) if c > DOMINANCE_TREND_POINTS => DominanceTrend::Rising,
        Some(c) if c < -DOMINANCE_TREND_POINTS => DominanceTrend::Falling,
        Some(_) => DominanceTrend::Stable,
    }
}

/// Dominance and market-cap sections plus their alerts.
pub fn evaluate_global(
    global: &GlobalMarket,
    previous_dominance: Option<f64>,
) -> (DominanceSection, MarketCapSection, Vec<MacroAlert>) {
    let mut alerts = Vec::new();
    let change = previous_dominance.map(|prev| round2(global.btc_dominance - prev));
    let trend = dominance_trend(change);

    if let Some(c) = change
        && c.abs() > DOMINANCE_ALERT_POINTS
    {
        let (kind, note) = if c > 0.0 {
            (MacroAlertKind::DominanceRising, "rising, alt bleed likely")
        } else {
            (MacroAlertKind::DominanceFalling, "falling, alt-season signal")
        };
        alerts.push(MacroAlert {
            kind,
            message: format!(
                "BTC dominance {:+.2} pts to {:.2}%: {}",
                c, global.btc_dominance, note
            ),
        });
    }

    if global.market_cap_change_24h_pct <= MARKET_CAP_DROP_PCT {
        alerts.push(MacroAlert {
            kind: MacroAlertKind::MarketCapDrop,
            message: format!(
                "Total market cap {:.2}% in 24h (${:.0}B)",
                global.market_cap_change_24h_pct,
                global.total_market_cap_usd / 1e9
            ),
        });
    }

    let dominance = DominanceSection {
        value: round2(global.btc_dominance),
        previous: previous_dominance,
        change,
        trend,
    };
    let market_cap = MarketCapSection {
        total_usd: global.total_market_cap_usd.round(),
        change_24h_pct: round2(global.market_cap_change_24h_pct),
    };
    (dominance, market_cap, alerts)
}

/// Safe-haven section. `log` is the price log as loaded, before this run's sample.
pub fn evaluate_safe_haven(
    haven: &Ticker24h,
    primary: &Ticker24h,
    log: &PriceLog,
    now_ms: i64,
) -> (SafeHavenSection, Option<MacroAlert>) {
    let delta = |window_ms: i64| {
        log.lookback(now_ms, window_ms, LOOKBACK_TOLERANCE)
            .and_then(|s| percent_change(s.price, haven.last_price))
            .map(round2)
    };

    let alert = (haven.price_change_percent > SAFE_HAVEN_UP_PCT
        && primary.price_change_percent < PRIMARY_DOWN_PCT)
        .then(|| MacroAlert {
            kind: MacroAlertKind::FlightToSafety,
            message: format!(
                "Flight to safety: {} {:+.2}% while {} {:+.2}% over 24h",
                haven.symbol, haven.price_change_percent, primary.symbol, primary.price_change_percent
            ),
        });

    let section = SafeHavenSection {
        symbol: haven.symbol.clone(),
        price: haven.last_price,
        change_24h_pct: round2(haven.price_change_percent),
        change_1h_pct: delta(LOOKBACK_1H_MS),
        change_4h_pct: delta(LOOKBACK_4H_MS),
        primary_symbol: primary.symbol.clone(),
        primary_change_24h_pct: round2(primary.price_change_percent),
    };
    (section, alert)
}

/// Keeps headlines published within `window_ms` of `now`, one flag per headline.
pub fn recent_flags(
    items: &[FeedItem],
    source: &str,
    matcher: &KeywordMatcher,
    now: DateTime<Utc>,
    window: chrono::Duration,
) -> Vec<NewsFlag> {
    items
        .iter()
        .filter(|item| item.published_at.is_some_and(|p| p >= now - window))
        .filter_map(|item| {
            matcher.first_match(&item.title).map(|keyword| NewsFlag {
                title: item.title.clone(),
                keyword: keyword.to_string(),
                source: source.to_string(),
                published_at: item.published_at,
            })
        })
        .collect()
}

//! Position surveillance rules for held trades.

use crate::domain::market::rolling_window::{PriceLog, percent_change};
use crate::domain::trading::types::{ActiveTrade, Direction, Ticker24h};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LOOKBACK_MS: i64 = 5 * 60 * 1000;
pub const HISTORY_WINDOW_MS: i64 = 30 * 60 * 1000;
pub const ALERT_CHANGE_PCT: f64 = -1.5;
pub const DANGER_CHANGE_PCT: f64 = -3.0;

const SPIKE_MIN_SAMPLES: usize = 3;
const SPIKE_RANGE_PCT: f64 = 1.5;
const SPIKE_DAILY_CHANGE_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelLevel {
    Alert,
    Danger,
    VolumeSpike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentinelAlert {
    pub symbol: String,
    pub direction: Direction,
    pub level: SentinelLevel,
    pub change_5m: f64,
    pub current_price: f64,
    pub entry_price: f64,
    pub pnl_percent: f64,
    pub message: String,
}

/// Written to `sentinel-alerts.json` only when at least one alert fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelAlertSnapshot {
    pub timestamp: DateTime<Utc>,
    pub alerts: Vec<SentinelAlert>,
}

/// Per-symbol price logs persisted in `sentinel-prices.json`.
pub type PriceHistoryBook = BTreeMap<String, PriceLog>;

/// Price move adjusted so that a move against the position is negative.
pub fn adverse_change(change_pct: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Long => change_pct,
        Direction::Short => -change_pct,
    }
}

/// Signed unrealised PnL in percent of entry.
pub fn pnl_percent(entry_price: f64, current_price: f64, direction: Direction) -> f64 {
    percent_change(entry_price, current_price)
        .map(|c| adverse_change(c, direction))
        .unwrap_or(0.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Applies the adverse-move and volume-spike rules to one held position.
///
/// `log` must already contain the current sample and be pruned.
pub fn evaluate_position(
    trade: &ActiveTrade,
    ticker: &Ticker24h,
    log: &PriceLog,
    now_ms: i64,
) -> Vec<SentinelAlert> {
    let current = ticker.last_price;
    let change_5m = log
        .at_or_before(now_ms - LOOKBACK_MS)
        .and_then(|s| percent_change(s.price, current));
    let pnl = round2(pnl_percent(trade.entry_price, current, trade.direction));

    let alert = |level: SentinelLevel, change: f64, message: String| SentinelAlert {
        symbol: trade.symbol.clone(),
        direction: trade.direction,
        level,
        change_5m: round2(change),
        current_price: current,
        entry_price: trade.entry_price,
        pnl_percent: pnl,
        message,
    };

    let mut alerts = Vec::new();

    if let Some(change) = change_5m {
        let adverse = adverse_change(change, trade.direction);
        let level = if adverse <= DANGER_CHANGE_PCT {
            Some(SentinelLevel::Danger)
        } else if adverse <= ALERT_CHANGE_PCT {
            Some(SentinelLevel::Alert)
        } else {
            None
        };
        if let Some(level) = level {
            let label = if level == SentinelLevel::Danger { "DANGER" } else { "ALERT" };
            alerts.push(alert(
                level,
                change,
                format!(
                    "{} {} {}: {:+.2}% in 5m against position (PnL {:+.2}%)",
                    label, trade.direction, trade.symbol, change, pnl
                ),
            ));
        }
    }

    let recent = log.since(now_ms - LOOKBACK_MS);
    if recent.len() >= SPIKE_MIN_SAMPLES && current > 0.0 {
        let (lo, hi) = recent
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), s| (lo.min(s.price), hi.max(s.price)));
        let range_pct = (hi - lo) / current * 100.0;
        if range_pct > SPIKE_RANGE_PCT
            && ticker.quote_volume > 0.0
            && ticker.price_change_percent.abs() > SPIKE_DAILY_CHANGE_PCT
        {
            alerts.push(alert(
                SentinelLevel::VolumeSpike,
                change_5m.unwrap_or(0.0),
                format!(
                    "VOLUME SPIKE {}: {:.2}% range in 5m, {:+.2}% in 24h",
                    trade.symbol, range_pct, ticker.price_change_percent
                ),
            ));
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    fn trade(direction: Direction, entry: f64) -> ActiveTrade {
        ActiveTrade {
            symbol: "SOLUSDT".to_string(),
            direction,
            entry_price: entry,
            position_size: 1.0,
        }
    }

    fn ticker(price: f64, change_24h: f64) -> Ticker24h {
        Ticker24h {
            symbol: "SOLUSDT".to_string(),
            last_price: price,
            price_change_percent: change_24h,
            quote_volume: 1_000_000.0,
        }
    }

    #[test]
    fn test_long_drop_fires_danger() {
        let now = 100 * MIN;
        let mut log = PriceLog::new();
        log.push(100.0, now - 6 * MIN);
        log.push(96.0, now);

        let alerts = evaluate_position(&trade(Direction::Long, 90.0), &ticker(96.0, 0.0), &log, now);
        assert_eq!(alerts.len(), 1);
        let a = &alerts[0];
        assert_eq!(a.level, SentinelLevel::Danger);
        assert_eq!(a.change_5m, -4.0);
        assert!((a.pnl_percent - 6.67).abs() < 0.01);
    }

    #[test]
    fn test_short_rally_is_adverse() {
        let now = 100 * MIN;
        let mut log = PriceLog::new();
        log.push(100.0, now - 5 * MIN);
        log.push(102.0, now);

        let alerts = evaluate_position(&trade(Direction::Short, 101.0), &ticker(102.0, 0.0), &log, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, SentinelLevel::Alert);
        assert!(alerts[0].pnl_percent < 0.0);
    }

    #[test]
    fn test_favourable_move_is_quiet() {
        let now = 100 * MIN;
        let mut log = PriceLog::new();
        log.push(100.0, now - 5 * MIN);
        log.push(96.0, now);

        let alerts = evaluate_position(&trade(Direction::Short, 100.0), &ticker(96.0, 0.0), &log, now);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_no_reference_sample_no_price_alert() {
        let now = 100 * MIN;
        let mut log = PriceLog::new();
        log.push(50.0, now);
        let alerts = evaluate_position(&trade(Direction::Long, 100.0), &ticker(50.0, 0.0), &log, now);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_volume_spike_heuristic() {
        let now = 100 * MIN;
        let mut log = PriceLog::new();
        log.push(100.0, now - 4 * MIN);
        log.push(103.0, now - 2 * MIN);
        log.push(101.0, now);

        let alerts = evaluate_position(&trade(Direction::Long, 90.0), &ticker(101.0, 7.0), &log, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, SentinelLevel::VolumeSpike);

        // Calm 24h change suppresses the spike
        let alerts = evaluate_position(&trade(Direction::Long, 90.0), &ticker(101.0, 2.0), &log, now);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_pnl_percent_by_direction() {
        assert!((pnl_percent(100.0, 110.0, Direction::Long) - 10.0).abs() < 1e-9);
        assert!((pnl_percent(100.0, 110.0, Direction::Short) + 10.0).abs() < 1e-9);
        assert_eq!(pnl_percent(0.0, 110.0, Direction::Long), 0.0);
    }
}

//! Per-pair opportunity scoring.
//!
//! A pair's score is the sum of four sub-scores (volume, volatility,
//! technical, momentum), each capped on its own before summing.

use crate::domain::errors::MarketDataError;
use crate::domain::market::indicators::{self, Crossover};
use crate::domain::trading::types::Candle;
use serde::{Deserialize, Serialize};

pub const MIN_CANDLES: usize = 20;
pub const RSI_PERIOD: usize = 14;
const SMA_FAST: usize = 7;
const SMA_SLOW: usize = 20;
const MOMENTUM_LOOKBACK: usize = 10;

const TECHNICAL_CAP: u32 = 25;
const MOMENTUM_CAP: u32 = 25;

/// Indicator values derived from one pair's candle window.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinMetrics {
    pub symbol: String,
    pub volume_24h: f64,
    pub last_close: f64,
    pub atr_pct: f64,
    pub rsi: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub sma_fast_prev: f64,
    pub sma_slow_prev: f64,
    pub volume_ratio: f64,
    pub momentum_pct: f64,
    pub momentum_1_pct: f64,
}

impl CoinMetrics {
    /// Computes indicators; fails if the window is too short to score.
    pub fn from_candles(
        symbol: &str,
        volume_24h: f64,
        candles: &[Candle],
    ) -> Result<Self, MarketDataError> {
        if candles.len() < MIN_CANDLES {
            return Err(MarketDataError::InsufficientCandles {
                symbol: symbol.to_string(),
                got: candles.len(),
                need: MIN_CANDLES,
            });
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let invalid = |reason: &str| MarketDataError::InvalidData {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        };

        let atr_pct = indicators::atr_percent(candles).ok_or_else(|| invalid("non-positive close"))?;
        let sma_fast = indicators::sma(&closes, SMA_FAST, 0).ok_or_else(|| invalid("sma7"))?;
        let sma_slow = indicators::sma(&closes, SMA_SLOW, 0).ok_or_else(|| invalid("sma20"))?;
        // With exactly MIN_CANDLES closes there is no previous SMA20; treat it as unchanged.
        let sma_fast_prev = indicators::sma(&closes, SMA_FAST, 1).unwrap_or(sma_fast);
        let sma_slow_prev = indicators::sma(&closes, SMA_SLOW, 1).unwrap_or(sma_slow);

        Ok(Self {
            symbol: symbol.to_string(),
            volume_24h,
            last_close: closes[closes.len() - 1],
            atr_pct,
            rsi: indicators::rsi(&closes, RSI_PERIOD),
            sma_fast,
            sma_slow,
            sma_fast_prev,
            sma_slow_prev,
            volume_ratio: indicators::volume_ratio(candles),
            momentum_pct: indicators::momentum_percent(&closes, MOMENTUM_LOOKBACK).unwrap_or(0.0),
            momentum_1_pct: indicators::momentum_percent(&closes, 1).unwrap_or(0.0),
        })
    }
}

/// A scored pair. The core/hedge tags are only used while assembling the watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinScore {
    pub symbol: String,
    pub score: u32,
    pub volume_24h: f64,
    pub atr_pct: f64,
    pub rsi: f64,
    pub momentum_pct: f64,
    pub reason: String,
    #[serde(skip_serializing, default)]
    pub is_core: bool,
    #[serde(skip_serializing, default)]
    pub is_hedge: bool,
}

/// Step function over 24h quote volume.
pub fn volume_score(volume_24h: f64) -> (u32, Option<&'static str>) {
    match volume_24h {
        v if v >= 1_000_000_000.0 => (25, Some("very high volume")),
        v if v >= 500_000_000.0 => (20, Some("high volume")),
        v if v >= 100_000_000.0 => (15, None),
        v if v >= 20_000_000.0 => (10, None),
        _ => (5, None),
    }
}

/// Rewards an ATR% inside the 3-8% band, partially rewards the shoulders.
pub fn volatility_score(atr_pct: f64) -> (u32, Option<&'static str>) {
    if (3.0..=8.0).contains(&atr_pct) {
        (25, Some("ideal volatility"))
    } else if (2.0..3.0).contains(&atr_pct) || (atr_pct > 8.0 && atr_pct <= 12.0) {
        (15, None)
    } else if atr_pct > 12.0 {
        (5, Some("extreme volatility"))
    } else {
        (5, None)
    }
}

pub fn technical_score(m: &CoinMetrics) -> (u32, Vec<&'static str>) {
    let mut points = 0;
    let mut reasons = Vec::new();

    if m.rsi < 35.0 {
        points += 8;
        reasons.push("RSI oversold");
    } else if m.rsi > 65.0 {
        points += 8;
        reasons.push("RSI overbought");
    }

    if m.sma_slow > 0.0 && ((m.last_close - m.sma_slow) / m.sma_slow).abs() <= 0.03 {
        points += 5;
        reasons.push("near SMA20");
    }

    match indicators::detect_crossover(m.sma_fast_prev, m.sma_slow_prev, m.sma_fast, m.sma_slow) {
        Some(Crossover::Bullish) => {
            points += 8;
            reasons.push("bullish SMA7/20 cross");
        }
        Some(Crossover::Bearish) => {
            points += 8;
            reasons.push("bearish SMA7/20 cross");
        }
        None => {}
    }

    if m.volume_ratio > 1.3 {
        points += 6;
        reasons.push("volume surge");
    }

    (points.min(TECHNICAL_CAP), reasons)
}

pub fn momentum_score(m: &CoinMetrics) -> (u32, Vec<&'static str>) {
    let mut points = 0;
    let mut reasons = Vec::new();

    let m10 = m.momentum_pct.abs();
    if m10 > 10.0 {
        points += 15;
        reasons.push("strong momentum");
    } else if m10 > 5.0 {
        points += 10;
        reasons.push("momentum");
    } else if m10 > 2.0 {
        points += 5;
    }

    let m1 = m.momentum_1_pct.abs();
    if m1 > 3.0 {
        points += 10;
        reasons.push("sharp last candle");
    } else if m1 > 1.5 {
        points += 5;
    }

    (points.min(MOMENTUM_CAP), reasons)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Scores a pair and builds its human-readable reason.
pub fn score_coin(m: &CoinMetrics, is_core: bool, is_hedge: bool) -> CoinScore {
    let (vol_pts, vol_reason) = volume_score(m.volume_24h);
    let (atr_pts, atr_reason) = volatility_score(m.atr_pct);
    let (tech_pts, tech_reasons) = technical_score(m);
    let (mom_pts, mom_reasons) = momentum_score(m);

    let reasons: Vec<&str> = vol_reason
        .into_iter()
        .chain(atr_reason)
        .chain(tech_reasons)
        .chain(mom_reasons)
        .collect();

    let reason = if reasons.is_empty() {
        "no strong signals".to_string()
    } else {
        reasons.join(", ")
    };

    CoinScore {
        symbol: m.symbol.clone(),
        score: vol_pts + atr_pts + tech_pts + mom_pts,
        volume_24h: m.volume_24h.round(),
        atr_pct: round2(m.atr_pct),
        rsi: round2(m.rsi),
        momentum_pct: round2(m.momentum_pct),
        reason,
        is_core,
        is_hedge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> CoinMetrics {
        CoinMetrics {
            symbol: "TESTUSDT".to_string(),
            volume_24h: 50_000_000.0,
            last_close: 100.0,
            atr_pct: 5.0,
            rsi: 50.0,
            sma_fast: 100.0,
            sma_slow: 120.0,
            sma_fast_prev: 100.0,
            sma_slow_prev: 121.0,
            volume_ratio: 1.0,
            momentum_pct: 0.0,
            momentum_1_pct: 0.0,
        }
    }

    fn flat_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                open_time: i as i64,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn test_volume_tiers() {
        assert_eq!(volume_score(2e9).0, 25);
        assert_eq!(volume_score(6e8).0, 20);
        assert_eq!(volume_score(2e8).0, 15);
        assert_eq!(volume_score(3e7).0, 10);
        assert_eq!(volume_score(1e6).0, 5);
    }

    #[test]
    fn test_volatility_prefers_ideal_band() {
        assert_eq!(volatility_score(5.0).0, 25);
        assert_eq!(volatility_score(2.5).0, 15);
        assert_eq!(volatility_score(10.0).0, 15);
        assert_eq!(volatility_score(1.0).0, 5);
        assert_eq!(volatility_score(20.0).0, 5);
    }

    #[test]
    fn test_technical_score_is_capped() {
        let mut m = metrics();
        m.rsi = 25.0; // +8
        m.sma_slow = 101.0; // within 3%: +5
        m.sma_fast_prev = 100.0;
        m.sma_slow_prev = 101.0;
        m.sma_fast = 102.0; // bullish cross: +8
        m.volume_ratio = 2.0; // +6
        let (points, reasons) = technical_score(&m);
        assert_eq!(points, 25);
        assert_eq!(reasons.len(), 4);
    }

    #[test]
    fn test_momentum_score_is_capped() {
        let mut m = metrics();
        m.momentum_pct = -14.0;
        m.momentum_1_pct = 4.0;
        let (points, _) = momentum_score(&m);
        assert_eq!(points, 25);
    }

    #[test]
    fn test_score_is_sum_of_subscores() {
        let m = metrics();
        let score = score_coin(&m, false, false);
        // volume 10 + volatility 25 + technical 0 + momentum 0
        assert_eq!(score.score, 35);
        assert!(score.reason.contains("ideal volatility"));
    }

    #[test]
    fn test_metrics_require_twenty_candles() {
        let err = CoinMetrics::from_candles("XUSDT", 1.0, &flat_candles(19)).unwrap_err();
        assert!(matches!(err, MarketDataError::InsufficientCandles { got: 19, .. }));
        assert!(CoinMetrics::from_candles("XUSDT", 1.0, &flat_candles(20)).is_ok());
    }

    #[test]
    fn test_tags_not_serialized() {
        let score = score_coin(&metrics(), true, false);
        let json = serde_json::to_value(&score).unwrap();
        assert!(json.get("isCore").is_none());
        assert!(json.get("isHedge").is_none());
        assert!(json.get("volume24h").is_some());
    }
}

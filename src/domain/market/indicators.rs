//! Technical indicators over closed candle sequences.
//!
//! All functions are pure and deterministic for a fixed input slice.

use crate::domain::trading::types::Candle;

/// Neutral RSI reported when there is not enough history.
pub const RSI_NEUTRAL: f64 = 50.0;

/// Average True Range expressed as a percentage of the last close.
///
/// True range of candle `i` is `max(high - low, |high - prev_close|, |low - prev_close|)`;
/// the ATR is the plain mean over every candle that has a predecessor.
pub fn atr_percent(candles: &[Candle]) -> Option<f64> {
    if candles.len() < 2 {
        return None;
    }

    let tr_sum: f64 = candles
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let c = &pair[1];
            (c.high - c.low)
                .max((c.high - prev_close).abs())
                .max((c.low - prev_close).abs())
        })
        .sum();

    let atr = tr_sum / (candles.len() - 1) as f64;
    let last_close = candles.last()?.close;
    if last_close <= 0.0 {
        return None;
    }

    Some(atr / last_close * 100.0)
}

/// Relative Strength Index with Wilder smoothing.
///
/// The first `period` close-to-close differences seed the average gain and
/// loss; every later difference is folded in as `(avg * (period - 1) + x) / period`.
/// Returns [`RSI_NEUTRAL`] with fewer than `period + 1` closes and `100` when
/// the average loss is zero.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return RSI_NEUTRAL;
    }

    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = diffs.split_at(period);

    let mut avg_gain = seed.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = seed.iter().filter(|d| **d < 0.0).map(|d| -d).sum::<f64>() / period as f64;

    let p = period as f64;
    for d in rest {
        let gain = d.max(0.0);
        let loss = (-d).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Simple moving average of the `period` closes ending `offset` bars before the last one.
///
/// `offset = 0` is the current bar, `offset = 1` the previous bar.
pub fn sma(closes: &[f64], period: usize, offset: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + offset {
        return None;
    }
    let end = closes.len() - offset;
    let window = &closes[end - period..end];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Last candle volume divided by the mean volume of all prior candles.
pub fn volume_ratio(candles: &[Candle]) -> f64 {
    let Some((last, prior)) = candles.split_last() else {
        return 0.0;
    };
    if prior.is_empty() {
        return 0.0;
    }

    let mean = prior.iter().map(|c| c.volume).sum::<f64>() / prior.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    last.volume / mean
}

/// Percentage change between the last close and the close `lookback` bars earlier.
///
/// Falls back to the first close when the series is shorter than `lookback + 1`.
pub fn momentum_percent(closes: &[f64], lookback: usize) -> Option<f64> {
    let last = *closes.last()?;
    let base_idx = closes.len().saturating_sub(lookback + 1);
    let base = closes[base_idx];
    if base <= 0.0 || base_idx == closes.len() - 1 {
        return None;
    }
    Some((last - base) / base * 100.0)
}

/// Direction of a fresh fast/slow moving average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Bullish,
    Bearish,
}

/// Detects a crossover between the previous bar and the current bar.
pub fn detect_crossover(
    fast_prev: f64,
    slow_prev: f64,
    fast_now: f64,
    slow_now: f64,
) -> Option<Crossover> {
    if fast_prev <= slow_prev && fast_now > slow_now {
        Some(Crossover::Bullish)
    } else if fast_prev >= slow_prev && fast_now < slow_now {
        Some(Crossover::Bearish)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: 0,
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn test_rsi_neutral_when_short_history() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&closes, 14), RSI_NEUTRAL);
        assert_eq!(rsi(&[], 14), RSI_NEUTRAL);
    }

    #[test]
    fn test_rsi_is_100_without_losses() {
        let closes: Vec<f64> = (0..21).map(|i| 100.0 + i as f64 * 0.5).collect();
        assert_eq!(rsi(&closes, 14), 100.0);
    }

    #[test]
    fn test_rsi_is_zero_without_gains() {
        let closes: Vec<f64> = (0..21).map(|i| 200.0 - i as f64).collect();
        assert!(rsi(&closes, 14).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_balanced_moves_near_fifty() {
        let closes: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let value = rsi(&closes, 14);
        assert!((value - 50.0).abs() < 5.0, "rsi = {}", value);
        // Deterministic for identical input
        assert_eq!(value, rsi(&closes, 14));
    }

    #[test]
    fn test_atr_percent_uses_previous_close() {
        let candles = vec![
            candle(101.0, 99.0, 100.0, 1.0),
            // gap up: |high - prev_close| = 10 dominates high-low = 2
            candle(110.0, 108.0, 109.0, 1.0),
            candle(110.0, 106.0, 108.0, 1.0),
        ];
        // TRs: 10, 4 => mean 7, last close 108
        let atr = atr_percent(&candles).unwrap();
        assert!((atr - 7.0 / 108.0 * 100.0).abs() < 1e-9);
        assert!(atr_percent(&candles[..1]).is_none());
    }

    #[test]
    fn test_sma_current_and_previous() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&closes, 3, 0), Some(4.0));
        assert_eq!(sma(&closes, 3, 1), Some(3.0));
        assert_eq!(sma(&closes, 5, 1), None);
    }

    #[test]
    fn test_volume_ratio_against_prior_mean() {
        let candles = vec![
            candle(1.0, 1.0, 1.0, 100.0),
            candle(1.0, 1.0, 1.0, 300.0),
            candle(1.0, 1.0, 1.0, 400.0),
        ];
        assert!((volume_ratio(&candles) - 2.0).abs() < 1e-9);
        assert_eq!(volume_ratio(&candles[..1]), 0.0);
    }

    #[test]
    fn test_momentum_percent() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        // last = 111, 10 bars back = 101
        let m = momentum_percent(&closes, 10).unwrap();
        assert!((m - 10.0 / 101.0 * 100.0).abs() < 1e-9);
        let one = momentum_percent(&closes, 1).unwrap();
        assert!((one - 1.0 / 110.0 * 100.0).abs() < 1e-9);
        assert!(momentum_percent(&[5.0], 1).is_none());
    }

    #[test]
    fn test_detect_crossover() {
        assert_eq!(detect_crossover(9.0, 10.0, 11.0, 10.0), Some(Crossover::Bullish));
        assert_eq!(detect_crossover(11.0, 10.0, 9.0, 10.0), Some(Crossover::Bearish));
        assert_eq!(detect_crossover(11.0, 10.0, 12.0, 10.0), None);
    }
}

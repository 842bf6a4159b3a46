use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLCV bar for a pair/timeframe. Sequences are ordered by `open_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Rolling 24h statistics for a single exchange pair
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker24h {
    pub symbol: String,
    pub last_price: f64,
    pub price_change_percent: f64,
    pub quote_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A position currently held according to the external trading board.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTrade {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub position_size: f64,
}

// ===== Symbol Normalization =====

/// Quote currencies recognised when turning a free-form coin label into a pair, in priority order.
const PAIR_QUOTE_CURRENCIES: &[&str] = &["USDT", "USDC", "BUSD", "BTC", "ETH"];

const DEFAULT_QUOTE: &str = "USDT";

/// Converts a coin label from the trading board into an exchange pair symbol.
///
/// Non-alphanumeric characters are stripped and the result is upper-cased.
/// If the remainder ends in a known quote currency (with a non-empty base)
/// it is used as-is, otherwise `USDT` is appended.
///
/// ```
/// use market_pulse::domain::trading::types::normalize_pair_symbol;
///
/// assert_eq!(normalize_pair_symbol("btc/usdt"), "BTCUSDT");
/// assert_eq!(normalize_pair_symbol("SOL"), "SOLUSDT");
/// assert_eq!(normalize_pair_symbol("ETH-BTC"), "ETHBTC");
/// ```
pub fn normalize_pair_symbol(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();

    for quote in PAIR_QUOTE_CURRENCIES {
        if cleaned.len() > quote.len() && cleaned.ends_with(quote) {
            return cleaned;
        }
    }

    format!("{}{}", cleaned, DEFAULT_QUOTE)
}

/// Returns the base asset of a pair quoted in `quote`, if it is.
pub fn base_asset<'a>(symbol: &'a str, quote: &str) -> Option<&'a str> {
    symbol
        .strip_suffix(quote)
        .filter(|base| !base.is_empty())
}

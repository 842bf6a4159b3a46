//! Opportunity scanner configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScannerEnvConfig {
    pub quote_asset: String,
    pub min_volume_usd: f64,
    pub stablecoins: Vec<String>,
    pub core_symbols: Vec<String>,
    pub hedge_symbol: String,
    pub interval: String,
    pub candle_limit: u16,
    pub pair_delay: Duration,
}

impl Default for ScannerEnvConfig {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".to_string(),
            min_volume_usd: 5_000_000.0,
            stablecoins: [
                "USDC", "BUSD", "TUSD", "FDUSD", "DAI", "USDP", "USDD", "PYUSD", "EUR", "AEUR",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            core_symbols: vec![
                "BTCUSDT".to_string(),
                "ETHUSDT".to_string(),
                "SOLUSDT".to_string(),
            ],
            hedge_symbol: "PAXGUSDT".to_string(),
            interval: "4h".to_string(),
            candle_limit: 50,
            pair_delay: Duration::from_millis(120),
        }
    }
}

impl ScannerEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let min_volume_usd = match env::var("SCANNER_MIN_VOLUME_USD") {
            Ok(v) => v
                .parse::<f64>()
                .context("Failed to parse SCANNER_MIN_VOLUME_USD")?,
            Err(_) => defaults.min_volume_usd,
        };
        let pair_delay = match env::var("SCANNER_PAIR_DELAY_MS") {
            Ok(v) => Duration::from_millis(
                v.parse::<u64>()
                    .context("Failed to parse SCANNER_PAIR_DELAY_MS")?,
            ),
            Err(_) => defaults.pair_delay,
        };

        Ok(Self {
            min_volume_usd,
            pair_delay,
            ..defaults
        })
    }
}

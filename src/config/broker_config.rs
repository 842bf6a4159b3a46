//! Upstream endpoint configuration parsing from environment variables.
//!
//! This module handles loading base URLs and timeouts for:
//! - Binance (public market data)
//! - alternative.me (Fear & Greed index)
//! - CoinGecko (global market aggregates)
//! - the trading board API (active positions)

use std::env;
use std::time::Duration;

/// Binance public REST configuration
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub ping_timeout: Duration,
}

impl BinanceConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            ping_timeout: Duration::from_secs(5),
        }
    }
}

/// Third-party macro data sources
#[derive(Debug, Clone)]
pub struct DataSourceConfig {
    pub fear_greed_url: String,
    pub global_market_url: String,
}

impl DataSourceConfig {
    pub fn from_env() -> Self {
        Self {
            fear_greed_url: env::var("FEAR_GREED_URL")
                .unwrap_or_else(|_| "https://api.alternative.me/fng/?limit=2".to_string()),
            global_market_url: env::var("GLOBAL_MARKET_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3/global".to_string()),
        }
    }
}

/// Trading board API holding active positions
#[derive(Debug, Clone)]
pub struct TradeBoardConfig {
    pub base_url: String,
    pub board_id: String,
}

impl TradeBoardConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("TRADE_BOARD_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            board_id: env::var("TRADE_BOARD_ID").unwrap_or_else(|_| "trading".to_string()),
        }
    }
}

/// Aggregated upstream configuration
#[derive(Debug, Clone)]
pub struct UpstreamEnvConfig {
    pub binance: BinanceConfig,
    pub data_sources: DataSourceConfig,
    pub trade_board: TradeBoardConfig,
    pub http_timeout: Duration,
}

impl UpstreamEnvConfig {
    pub fn from_env() -> Self {
        let timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(8);

        Self {
            binance: BinanceConfig::from_env(),
            data_sources: DataSourceConfig::from_env(),
            trade_board: TradeBoardConfig::from_env(),
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

pub mod binance;
pub mod core;
pub mod global;
pub mod mock;
pub mod news;
pub mod persistence;
pub mod sentiment;
pub mod trade_board;

pub use binance::BinanceMarketDataService;
pub use global::CoinGeckoGlobalProvider;
pub use news::{HttpFeedSource, PatternFeedExtractor};
pub use persistence::{JsonFileStore, RunLock};
pub use sentiment::AlternativeMeSentimentProvider;
pub use trade_board::HttpTradeBoard;

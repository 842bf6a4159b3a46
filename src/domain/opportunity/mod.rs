// Opportunity scanning: per-pair scoring and watchlist assembly
pub mod scoring;
pub mod watchlist;

pub use scoring::{CoinMetrics, CoinScore, score_coin};
pub use watchlist::{WatchlistSnapshot, assemble_watchlist};

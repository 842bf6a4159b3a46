pub mod coingecko;

pub use coingecko::CoinGeckoGlobalProvider;

pub mod feed_extractor;
pub mod http_feed;

pub use feed_extractor::PatternFeedExtractor;
pub use http_feed::HttpFeedSource;

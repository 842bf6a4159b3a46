use crate::domain::ports::FeedSource;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, ensure_success};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tracing::debug;

/// Fetches feed markup over HTTP. One client is shared by every feed of a run.
pub struct HttpFeedSource {
    client: ClientWithMiddleware,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_raw(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8",
            )
            .send()
            .await
            .with_context(|| format!("Failed to fetch feed {}", url))?;
        let response = ensure_success(response, url).await?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read feed body from {}", url))?;
        debug!("Feed {}: {} bytes", url, body.len());
        Ok(body)
    }
}

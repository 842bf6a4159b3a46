use crate::domain::sentiment::{FearGreedReading, SentimentClassification, SentimentProvider};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, ensure_success};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct AlternativeMeResponse {
    data: Vec<AlternativeMeData>,
}

#[derive(Debug, Deserialize)]
struct AlternativeMeData {
    value: String,
    timestamp: String,
}

pub struct AlternativeMeSentimentProvider {
    client: ClientWithMiddleware,
    url: String,
}

impl AlternativeMeSentimentProvider {
    /// `url` should request at least two entries (`?limit=2`) so the daily change can be derived.
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            url,
        }
    }
}

fn parse_reading(body: AlternativeMeResponse) -> anyhow::Result<FearGreedReading> {
    let mut entries = body.data.into_iter();
    let latest = entries
        .next()
        .context("No sentiment data found in response")?;

    let value: u8 = latest.value.parse().context("Failed to parse sentiment value")?;
    let timestamp_secs: i64 = latest
        .timestamp
        .parse()
        .context("Failed to parse timestamp")?;
    let timestamp = Utc
        .timestamp_opt(timestamp_secs, 0)
        .single()
        .context("Sentiment timestamp out of range")?;
    let previous = entries.next().and_then(|d| d.value.parse::<u8>().ok());

    // Re-classify based on our domain rules to ensure consistency
    Ok(FearGreedReading {
        value,
        previous,
        classification: SentimentClassification::from_score(value),
        timestamp,
    })
}

#[async_trait]
impl SentimentProvider for AlternativeMeSentimentProvider {
    async fn fetch_fear_greed(&self) -> anyhow::Result<FearGreedReading> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to send request to Alternative.me")?;
        let response = ensure_success(response, "Alternative.me").await?;

        let body: AlternativeMeResponse = response
            .json()
            .await
            .context("Failed to parse Alternative.me response")?;

        let reading = parse_reading(body)?;
        debug!(
            "Fetched Fear & Greed: {} ({}), previous {:?}",
            reading.value, reading.classification, reading.previous
        );
        Ok(reading)
    }
}

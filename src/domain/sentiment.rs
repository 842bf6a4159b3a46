use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentClassification {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl fmt::Display for SentimentClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtremeFear => write!(f, "Extreme Fear"),
            Self::Fear => write!(f, "Fear"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Greed => write!(f, "Greed"),
            Self::ExtremeGreed => write!(f, "Extreme Greed"),
        }
    }
}

impl SentimentClassification {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => Self::ExtremeFear,
            25..=44 => Self::Fear,
            45..=55 => Self::Neutral,
            56..=75 => Self::Greed,
            _ => Self::ExtremeGreed,
        }
    }
}

/// Latest Fear & Greed index value together with the previous day's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FearGreedReading {
    pub value: u8, // 0-100
    pub previous: Option<u8>,
    pub classification: SentimentClassification,
    pub timestamp: DateTime<Utc>,
}

impl FearGreedReading {
    /// Change versus the previous daily reading.
    pub fn change_24h(&self) -> Option<i16> {
        self.previous.map(|p| i16::from(self.value) - i16::from(p))
    }
}

#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Fetch the current and previous Fear & Greed readings
    async fn fetch_fear_greed(&self) -> anyhow::Result<FearGreedReading>;
}

//! HTTP client for the external trading board that tracks open positions.

use crate::domain::ports::TradeBoard;
use crate::domain::trading::types::{ActiveTrade, Direction, normalize_pair_symbol};
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, build_url_with_query, ensure_success,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "x-api-key";

/// Numbers come back either as JSON numbers or as strings depending on the board version.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDto {
    #[serde(alias = "symbol", alias = "pair")]
    coin: Option<String>,
    #[serde(alias = "side")]
    direction: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    entry_price: Option<f64>,
    #[serde(default, deserialize_with = "number_or_string", alias = "size")]
    position_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TasksResponse {
    Bare(Vec<TaskDto>),
    Wrapped { tasks: Vec<TaskDto> },
}

impl TasksResponse {
    fn into_tasks(self) -> Vec<TaskDto> {
        match self {
            TasksResponse::Bare(tasks) | TasksResponse::Wrapped { tasks } => tasks,
        }
    }
}

fn parse_direction(raw: &str) -> Option<Direction> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "LONG" | "BUY" => Some(Direction::Long),
        "SHORT" | "SELL" => Some(Direction::Short),
        _ => None,
    }
}

impl TaskDto {
    /// Tasks without a coin, direction or positive entry price cannot be monitored.
    fn into_domain(self) -> Option<ActiveTrade> {
        let coin = self.coin.filter(|c| !c.trim().is_empty())?;
        let direction = parse_direction(self.direction.as_deref()?)?;
        let entry_price = self.entry_price.filter(|p| *p > 0.0)?;
        Some(ActiveTrade {
            symbol: normalize_pair_symbol(&coin),
            direction,
            entry_price,
            position_size: self.position_size.unwrap_or(0.0),
        })
    }
}

pub struct HttpTradeBoard {
    client: ClientWithMiddleware,
    base_url: String,
    board_id: String,
    api_key: String,
}

impl HttpTradeBoard {
    /// Single attempt per call: the sentinel runs every minute and a retry
    /// would double the worst-case fetch time.
    pub fn new(base_url: &str, board_id: &str, api_key: String, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client_with_retries(timeout, 0),
            base_url: base_url.trim_end_matches('/').to_string(),
            board_id: board_id.to_string(),
            api_key,
        }
    }

    fn tasks_url(&self) -> Result<String> {
        let url = build_url_with_query(
            &format!("{}/api/v1/boards/{}/tasks", self.base_url, self.board_id),
            &[("status", "Active")],
        )?;
        Ok(url)
    }
}

#[async_trait]
impl TradeBoard for HttpTradeBoard {
    async fn active_trades(&self) -> Result<Vec<ActiveTrade>> {
        let url = self.tasks_url()?;
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Failed to fetch active trades from trade board")?;
        let response = ensure_success(response, "TradeBoard").await?;

        let body: TasksResponse = response
            .json()
            .await
            .context("Failed to parse trade board response")?;

        let tasks = body.into_tasks();
        let total = tasks.len();
        let trades: Vec<ActiveTrade> = tasks.into_iter().filter_map(TaskDto::into_domain).collect();
        debug!("TradeBoard: {} active trades ({} tasks)", trades.len(), total);
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<ActiveTrade> {
        serde_json::from_str::<TasksResponse>(json)
            .unwrap()
            .into_tasks()
            .into_iter()
            .filter_map(TaskDto::into_domain)
            .collect()
    }

    #[test]
    fn test_bare_array_response() {
        let trades = parse(
            r#"[{"coin":"sol","direction":"long","entryPrice":142.5,"positionSize":"250"}]"#,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "SOLUSDT");
        assert_eq!(trades[0].direction, Direction::Long);
        assert_eq!(trades[0].position_size, 250.0);
    }

    #[test]
    fn test_wrapped_response_and_invalid_tasks() {
        let trades = parse(
            r#"{"tasks":[
                {"symbol":"ETH/BTC","direction":"SHORT","entryPrice":"0.052"},
                {"coin":"DOGE","direction":"sideways","entryPrice":0.1},
                {"coin":"ADA","direction":"LONG"}
            ]}"#,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "ETHBTC");
        assert_eq!(trades[0].direction, Direction::Short);
        assert_eq!(trades[0].entry_price, 0.052);
    }

    #[test]
    fn test_tasks_url() {
        let board = HttpTradeBoard::new(
            "http://localhost:3000/",
            "trading",
            "k".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(
            board.tasks_url().unwrap(),
            "http://localhost:3000/api/v1/boards/trading/tasks?status=Active"
        );
    }

    #[tokio::test]
    async fn test_unresponsive_board_fails_after_one_timeout() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let board = HttpTradeBoard::new(
            &format!("http://{}", addr),
            "trading",
            "k".to_string(),
            Duration::from_millis(300),
        );
        let started = std::time::Instant::now();
        assert!(board.active_trades().await.is_err());
        assert!(started.elapsed() < Duration::from_millis(1000));
    }
}

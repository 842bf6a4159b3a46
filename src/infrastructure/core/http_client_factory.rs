use crate::domain::errors::MarketDataError;
use reqwest::{Client, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use url::Url;

/// Retries used by `create_client`.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates an HTTP client with a hard timeout and one transient retry.
    ///
    /// The timeout applies per attempt, so a failing fetch can take up to
    /// `(DEFAULT_MAX_RETRIES + 1) * timeout` plus backoff. Callers on a tight
    /// cadence use `create_client_with_retries(timeout, 0)`.
    pub fn create_client(timeout: Duration) -> ClientWithMiddleware {
        Self::create_client_with_retries(timeout, DEFAULT_MAX_RETRIES)
    }

    pub fn create_client_with_retries(timeout: Duration, max_retries: u32) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .user_agent(concat!("market-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Appends URL-encoded query parameters to `base_url`.
///
/// reqwest-middleware's request builder does not expose `.query()`, so the
/// query string is assembled on the URL itself.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> Result<String, url::ParseError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let url = Url::parse_with_params(
        base_url,
        params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())),
    )?;
    Ok(url.to_string())
}

/// Converts a non-2xx response into a typed error carrying the body.
pub async fn ensure_success(response: Response, source_name: &str) -> Result<Response, MarketDataError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MarketDataError::HttpStatus {
        source_name: source_name.to_string(),
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_query_encodes_values() {
        let url = build_url_with_query(
            "https://api.binance.com/api/v3/ticker/24hr",
            &[("symbols", r#"["BTCUSDT","ETHUSDT"]"#)],
        )
        .unwrap();
        assert!(url.starts_with("https://api.binance.com/api/v3/ticker/24hr?symbols="));
        assert!(url.contains("%22BTCUSDT%22"));
    }

    #[test]
    fn test_build_url_keeps_existing_query() {
        let url = build_url_with_query("https://example.com/x?a=1", &[("b", "2")]).unwrap();
        assert_eq!(url, "https://example.com/x?a=1&b=2");
    }
}

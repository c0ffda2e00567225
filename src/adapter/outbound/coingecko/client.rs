//! HTTP client for the CoinGecko public API.
//!
//! The client makes exactly one request per call. Retries, timeouts across
//! attempts and circuit breaking belong to the resilience layer, so every
//! failure here is mapped onto a [`SourceError`] and returned.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{MarketChartResponse, SimplePriceResponse};
use super::settings::CoinGeckoConfig;
use crate::error::SourceError;
use crate::port::outbound::price::PriceSource;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko implementation of [`PriceSource`].
pub struct CoinGeckoClient {
    http: HttpClient,
    base_url: String,
    precision: u32,
    timeout: Duration,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    #[must_use]
    pub fn new(config: &CoinGeckoConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("pegwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            precision: config.precision,
            timeout: config.timeout(),
            api_key: config.api_key.clone(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.http.get(format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SourceError> {
        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let response = check_status(response)?;
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Malformed(e.to_string()))
    }

    fn transport_error(&self, err: &reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                after: self.timeout,
            }
        } else if err.is_decode() {
            SourceError::Malformed(err.to_string())
        } else {
            SourceError::Connection(err.to_string())
        }
    }
}

fn check_status(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        warn!(?retry_after, "CoinGecko rate limit exceeded");
        return Err(SourceError::RateLimited { retry_after });
    }
    if status.is_server_error() {
        return Err(SourceError::Upstream {
            status: status.as_u16(),
        });
    }
    Err(SourceError::Invalid(format!(
        "request rejected with status {}",
        status.as_u16()
    )))
}

/// `Retry-After` as delta-seconds. HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_current(&self, ids: &[String]) -> Result<HashMap<String, Decimal>, SourceError> {
        if ids.is_empty() {
            warn!("No coin ids requested, skipping price fetch");
            return Ok(HashMap::new());
        }

        let precision = self.precision.to_string();
        let request = self.get("/simple/price").query(&[
            ("ids", ids.join(",").as_str()),
            ("vs_currencies", "usd"),
            ("precision", precision.as_str()),
        ]);
        let body: SimplePriceResponse = self.send(request).await?;
        let prices = body.usd_prices(self.precision);

        debug!(requested = ids.len(), received = prices.len(), "Fetched spot prices");
        Ok(prices)
    }

    async fn fetch_history(&self, source_id: &str, days: u32) -> Result<Vec<f64>, SourceError> {
        if source_id.is_empty() {
            return Err(SourceError::Invalid("empty coin id".to_string()));
        }

        let days = days.max(1).to_string();
        let request = self
            .get(&format!("/coins/{source_id}/market_chart"))
            .query(&[("vs_currency", "usd"), ("days", days.as_str())]);
        let body: MarketChartResponse = self.send(request).await?;
        Ok(body.into_prices())
    }

    fn name(&self) -> &'static str {
        "coingecko"
    }
}

//! # Market-Data API Client
//!
//! A rate-limited, retry-aware client for the upstream market-data API, plus
//! the Yahoo-Finance-backed equities provider and the persisted raw-data
//! snapshot.
//!
//! ## Architectural Principles
//!
//! - **Sequential by design:** there is no parallel fetch fan-out. Every
//!   request passes through the instance's `RateLimiter`, whose suspension
//!   is the only blocking point in a run.
//! - **Errors become missing data at the boundary:** transient failures
//!   (429 after the retry budget, 5xx, network) are surfaced so callers can
//!   skip the offending asset and continue; only credential and schema
//!   failures are fatal.

use crate::error::ApiError;
use crate::limiter::RateLimiter;
use crate::responses::{HistoryResponse, MarketAsset, MarketAssetResponse, MarketChartResponse};
use async_trait::async_trait;
use chrono::NaiveDate;
use configuration::{ApiAuth, ApiSettings, UniverseSettings};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

pub mod equities;
pub mod error;
mod limiter;
pub mod responses;
pub mod snapshot;

// --- Public API ---
pub use equities::EquitiesProvider;
pub use responses::{HistoryMarketData, MarketChartResponse as MarketChart};
pub use snapshot::RawSnapshot;

/// The generic, abstract interface for the market-data API. This trait is
/// the contract the pipeline orchestrator uses, allowing the underlying
/// implementation (live or mock) to be swapped out.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Fetches the top assets by market cap, paginating the list endpoint
    /// and applying the configured exclusion filter per page.
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<MarketAsset>, ApiError>;

    /// Fetches `days` of daily historical prices and market caps for one asset.
    async fn fetch_market_chart(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<MarketChartResponse, ApiError>;

    /// Fetches the point-in-time USD price of one asset on a calendar date.
    /// `Ok(None)` means the API has no usable observation for that date.
    async fn fetch_price_on(
        &self,
        asset_id: &str,
        date: NaiveDate,
    ) -> Result<Option<f64>, ApiError>;
}

/// A concrete implementation of `MarketDataApi` for the CoinGecko API.
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    auth: ApiAuth,
    backoff: Duration,
    page_size: usize,
    excluded_ids: HashSet<String>,
    limiter: Mutex<RateLimiter>,
}

impl CoinGeckoClient {
    pub fn new(api: &ApiSettings, universe: &UniverseSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key: api.api_key.clone(),
            auth: api.auth,
            backoff: Duration::from_secs(api.rate_limit_backoff_secs),
            page_size: universe.page_size,
            excluded_ids: universe.excluded_ids.iter().cloned().collect(),
            limiter: Mutex::new(RateLimiter::new(Duration::from_millis(
                api.min_request_interval_ms,
            ))),
        }
    }

    /// Issues one rate-limited GET and deserializes the JSON body.
    ///
    /// An HTTP 429 is retried exactly once after the configured backoff; a
    /// second 429 surfaces as `ApiError::RateLimited`. 401/403 and malformed
    /// JSON are fatal; everything else is transient.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut retried = false;

        loop {
            self.limiter.lock().await.acquire().await;

            let mut request = self.client.get(&url).query(params);
            if let Some(key) = &self.api_key {
                request = match self.auth {
                    ApiAuth::Header => request.header("x-cg-demo-api-key", key),
                    ApiAuth::Query => request.query(&[("x_cg_demo_api_key", key)]),
                };
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                let text = response.text().await?;
                return serde_json::from_str::<T>(&text)
                    .map_err(|e| ApiError::Deserialization(format!("{}: {}", path, e)));
            }

            match status.as_u16() {
                429 if !retried => {
                    retried = true;
                    tracing::warn!(
                        path,
                        backoff_secs = self.backoff.as_secs(),
                        "Rate limit exceeded, backing off before the single retry"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                429 => return Err(ApiError::RateLimited(path.to_string())),
                401 | 403 => return Err(ApiError::Unauthorized(status.as_u16())),
                code if status.is_server_error() => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ApiError::ServerError(code, body));
                }
                code => return Err(ApiError::UnexpectedStatus(code, path.to_string())),
            }
        }
    }
}

#[async_trait]
impl MarketDataApi for CoinGeckoClient {
    async fn fetch_top_assets(&self, limit: usize) -> Result<Vec<MarketAsset>, ApiError> {
        let mut assets: Vec<MarketAsset> = Vec::new();
        let mut page = 1u32;

        while assets.len() < limit {
            let params = [
                ("vs_currency", "usd".to_string()),
                ("order", "market_cap_desc".to_string()),
                ("per_page", self.page_size.to_string()),
                ("page", page.to_string()),
                ("sparkline", "false".to_string()),
            ];

            let rows: Vec<MarketAssetResponse> =
                match self.get_json("coins/markets", &params).await {
                    Ok(rows) => rows,
                    Err(e) if e.is_transient() => {
                        // Keep the already-filtered partial results.
                        tracing::warn!(page, error = %e, "Stopping pagination early");
                        break;
                    }
                    Err(e) => return Err(e),
                };

            let page_len = rows.len();
            assets.extend(
                rows.into_iter()
                    .filter(|row| !self.excluded_ids.contains(&row.id))
                    .map(MarketAsset::from),
            );
            tracing::info!(page, kept = assets.len(), "Fetched asset listing page");

            // A short page means the end of the data.
            if page_len < self.page_size {
                break;
            }
            page += 1;
        }

        assets.truncate(limit);
        Ok(assets)
    }

    async fn fetch_market_chart(
        &self,
        asset_id: &str,
        days: u32,
    ) -> Result<MarketChartResponse, ApiError> {
        let params = [
            ("vs_currency", "usd".to_string()),
            ("days", days.to_string()),
            ("interval", "daily".to_string()),
        ];
        self.get_json(&format!("coins/{}/market_chart", asset_id), &params)
            .await
    }

    async fn fetch_price_on(
        &self,
        asset_id: &str,
        date: NaiveDate,
    ) -> Result<Option<f64>, ApiError> {
        let params = [("date", date.format("%d-%m-%Y").to_string())];
        let history: HistoryResponse = self
            .get_json(&format!("coins/{}/history", asset_id), &params)
            .await?;
        Ok(history.usd_price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_settings(base_url: String) -> (ApiSettings, UniverseSettings) {
        (
            ApiSettings {
                base_url,
                api_key: Some("test-key".to_string()),
                auth: ApiAuth::Header,
                // No throttling or backoff so the tests run on the real clock.
                min_request_interval_ms: 0,
                rate_limit_backoff_secs: 0,
            },
            UniverseSettings {
                top_n: 200,
                page_size: 2,
                excluded_ids: vec!["tether".to_string()],
                history_days: 365,
            },
        )
    }

    fn market_row(id: &str) -> String {
        format!(
            r#"{{"id": "{id}", "symbol": "{id}", "name": "{id}", "current_price": 1.0, "market_cap": 2.0}}"#
        )
    }

    #[tokio::test]
    async fn pagination_filters_excluded_ids_and_stops_at_short_page() {
        let mut server = mockito::Server::new_async().await;
        let page1 = server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(format!("[{},{}]", market_row("bitcoin"), market_row("tether")))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            // One row: a short page, so pagination stops here.
            .with_body(format!("[{}]", market_row("ethereum")))
            .create_async()
            .await;

        let (api, universe) = test_settings(server.url());
        let client = CoinGeckoClient::new(&api, &universe);
        let assets = client.fetch_top_assets(10).await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        let ids: Vec<&str> = assets.iter().map(|a| a.identity.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum"]);
    }

    #[tokio::test]
    async fn a_second_429_surfaces_as_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/bitcoin/market_chart")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(2)
            .create_async()
            .await;

        let (api, universe) = test_settings(server.url());
        let client = CoinGeckoClient::new(&api, &universe);
        let err = client.fetch_market_chart("bitcoin", 365).await.unwrap_err();

        // Exactly one retry happened before giving up.
        mock.assert_async().await;
        assert!(matches!(err, ApiError::RateLimited(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn credential_rejection_is_fatal_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::Any)
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let (api, universe) = test_settings(server.url());
        let client = CoinGeckoClient::new(&api, &universe);
        let err = client.fetch_top_assets(10).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::Unauthorized(403)));
    }

    #[tokio::test]
    async fn server_errors_mid_pagination_return_partial_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(format!("[{},{}]", market_row("bitcoin"), market_row("ethereum")))
            .create_async()
            .await;
        server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(500)
            .create_async()
            .await;

        let (api, universe) = test_settings(server.url());
        let client = CoinGeckoClient::new(&api, &universe);
        let assets = client.fetch_top_assets(10).await.unwrap();

        assert_eq!(assets.len(), 2);
    }

    #[tokio::test]
    async fn malformed_json_is_a_fatal_deserialization_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coins/bitcoin/market_chart")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let (api, universe) = test_settings(server.url());
        let client = CoinGeckoClient::new(&api, &universe);
        let err = client.fetch_market_chart("bitcoin", 365).await.unwrap_err();

        assert!(matches!(err, ApiError::Deserialization(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn history_endpoint_uses_day_month_year_dates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/bitcoin/history")
            .match_query(Matcher::UrlEncoded("date".into(), "04-11-2024".into()))
            .with_status(200)
            .with_body(r#"{"market_data": {"current_price": {"usd": 68000.5}}}"#)
            .create_async()
            .await;

        let (api, universe) = test_settings(server.url());
        let client = CoinGeckoClient::new(&api, &universe);
        let date = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let price = client.fetch_price_on("bitcoin", date).await.unwrap();

        mock.assert_async().await;
        assert_eq!(price, Some(68000.5));
    }
}

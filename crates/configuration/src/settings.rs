use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiSettings,
    pub universe: UniverseSettings,
    pub detection: DetectionSettings,
    pub windowing: WindowSettings,
    pub anchor: AnchorSettings,
    pub scatter: ScatterSettings,
    pub output: OutputSettings,
}

/// Where the API key travels on the wire. The upstream API accepts the key
/// either as a request header or as a query parameter, depending on the
/// endpoint and plan, so both must be supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiAuth {
    Header,
    Query,
}

/// Connection parameters for the upstream market-data API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the API (e.g., "https://api.coingecko.com/api/v3").
    pub base_url: String,
    /// The API key. Usually left unset in the file and injected from the
    /// COINGECKO_API_KEY environment variable at startup.
    pub api_key: Option<String>,
    /// How the key is attached to requests.
    pub auth: ApiAuth,
    /// Minimum interval between any two outbound requests, in milliseconds.
    /// The free tier tolerates roughly one request every 5-6 seconds.
    pub min_request_interval_ms: u64,
    /// How long to sleep before the single retry after an HTTP 429, in seconds.
    pub rate_limit_backoff_secs: u64,
}

/// Which assets make up the fetched universe.
#[derive(Debug, Clone, Deserialize)]
pub struct UniverseSettings {
    /// How many assets to keep after filtering, ordered by market cap.
    pub top_n: usize,
    /// Page size for the paginated list endpoint.
    pub page_size: usize,
    /// API identifiers to drop from every page (stablecoins, wrapped assets).
    pub excluded_ids: Vec<String>,
    /// How many days of history to request per asset.
    pub history_days: u32,
}

/// Parameters of the rolling-drawdown event detector.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSettings {
    /// Lookback for the rolling percentage change, in days.
    pub lookback_days: u32,
    /// Drop magnitude that qualifies as an event, as a fraction (0.10 = 10%).
    pub threshold_fraction: f64,
}

/// Parameters of the per-event forward window.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowSettings {
    /// Maximum window length in days (offset 0 through length_days - 1).
    pub length_days: u32,
}

/// Parameters of the fixed-anchor chart variant.
#[derive(Debug, Clone, Deserialize)]
pub struct AnchorSettings {
    /// The externally designated event date (e.g., 2025-04-02).
    pub date: NaiveDate,
    /// Crypto symbols admitted to the anchor chart (lowercase).
    pub allowed_symbols: Vec<String>,
    /// How many top assets to list before the symbol filter is applied.
    pub crypto_limit: usize,
    /// Days of data requested before the anchor date, so a missing start
    /// date (weekend, holiday) can still anchor the forward-fill.
    pub buffer_days: u32,
    /// Equity/ETF tickers and their display names (e.g., "^GSPC" = "S&P 500").
    pub equities: BTreeMap<String, String>,
}

/// Parameters of the since-a-date snapshot scatter.
#[derive(Debug, Clone, Deserialize)]
pub struct ScatterSettings {
    /// The historical comparison date (e.g., 2024-11-04).
    pub date: NaiveDate,
    /// How many top assets to place on the scatter, after exclusions.
    pub limit: usize,
}

/// Where run artifacts land on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// Path of the persisted raw-data snapshot written once per run.
    pub snapshot_path: String,
    /// Directory receiving the chart artifacts.
    pub charts_dir: String,
}

impl Config {
    /// Checks the cross-field invariants that serde alone cannot express.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError::ValidationError;

        if self.detection.threshold_fraction <= 0.0 {
            return Err(ValidationError(
                "detection.threshold_fraction must be positive".to_string(),
            ));
        }
        if self.detection.lookback_days == 0 {
            return Err(ValidationError(
                "detection.lookback_days must be at least 1".to_string(),
            ));
        }
        if self.windowing.length_days == 0 {
            return Err(ValidationError(
                "windowing.length_days must be at least 1".to_string(),
            ));
        }
        if self.universe.top_n == 0 || self.universe.page_size == 0 {
            return Err(ValidationError(
                "universe.top_n and universe.page_size must be positive".to_string(),
            ));
        }
        if self.scatter.limit == 0 {
            return Err(ValidationError(
                "scatter.limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

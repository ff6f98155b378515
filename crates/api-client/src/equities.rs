use crate::error::ApiError;
use core_types::RawSample;
use yahoo_finance_api as yahoo;

/// Daily-close provider for traditional assets (indices, ETFs) backed by
/// Yahoo Finance.
///
/// Emits the same `RawSample` shape as the crypto client so the downstream
/// aligner treats both sources identically. Equities only trade on business
/// days; the weekend/holiday gaps are closed later by forward-fill.
pub struct EquitiesProvider {
    connector: yahoo::YahooConnector,
}

impl EquitiesProvider {
    pub fn new() -> Result<Self, ApiError> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| ApiError::Equities(format!("connector: {}", e)))?;
        Ok(Self { connector })
    }

    /// Maps a requested day count onto the provider's fixed range buckets.
    fn range_for_days(days: u32) -> &'static str {
        match days {
            0..=5 => "5d",
            6..=28 => "1mo",
            29..=88 => "3mo",
            89..=178 => "6mo",
            179..=360 => "1y",
            361..=720 => "2y",
            721..=1800 => "5y",
            _ => "10y",
        }
    }

    /// Fetches at least `days` of daily closes for `ticker`, oldest first.
    pub async fn daily_closes(&self, ticker: &str, days: u32) -> Result<Vec<RawSample>, ApiError> {
        let range = Self::range_for_days(days);
        tracing::debug!(ticker, range, "Fetching equities daily closes");

        let response = self
            .connector
            .get_quote_range(ticker, "1d", range)
            .await
            .map_err(|e| ApiError::Equities(format!("{}: {}", ticker, e)))?;
        let quotes = response
            .quotes()
            .map_err(|e| ApiError::Equities(format!("{}: quote parse: {}", ticker, e)))?;

        if quotes.is_empty() {
            tracing::warn!(ticker, "No equities data returned");
        }

        // Quote timestamps are Unix seconds; the data model is milliseconds.
        let mut samples: Vec<RawSample> = quotes
            .iter()
            .map(|q| RawSample::new(q.timestamp as i64 * 1000, q.close))
            .collect();
        samples.sort_by_key(|s| s.timestamp_ms());
        Ok(samples)
    }
}

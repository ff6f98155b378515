use core_types::{AssetIdentity, RawSample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the `coins/markets` list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketAssetResponse {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
}

/// A listed asset after filtering: its identity plus the point-in-time
/// market fields the snapshot scatter needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAsset {
    pub identity: AssetIdentity,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
}

impl From<MarketAssetResponse> for MarketAsset {
    fn from(raw: MarketAssetResponse) -> Self {
        Self {
            identity: AssetIdentity {
                id: raw.id,
                symbol: raw.symbol,
                name: raw.name,
            },
            current_price: raw.current_price,
            market_cap: raw.market_cap,
        }
    }
}

/// The `coins/{id}/market_chart` payload: `[[timestamp_ms, value], ...]`
/// pairs for prices and market caps. Also the per-asset unit of the
/// persisted raw-data snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<RawSample>,
    #[serde(default)]
    pub market_caps: Vec<RawSample>,
}

/// The `coins/{id}/history` payload (point-in-time endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub market_data: Option<HistoryMarketData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMarketData {
    #[serde(default)]
    pub current_price: BTreeMap<String, Option<f64>>,
}

impl HistoryResponse {
    /// The USD price on the requested date, if the API has one and it is a
    /// sane value. Missing market data is the expected case for assets that
    /// did not trade yet, never an error.
    pub fn usd_price(&self) -> Option<f64> {
        let price = *self
            .market_data
            .as_ref()?
            .current_price
            .get("usd")?
            .as_ref()?;
        if price.is_finite() && price >= 0.0 {
            Some(price)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_chart_deserializes_wire_pairs() {
        let json = r#"{"prices": [[1730764800000, 68000.5]], "market_caps": [[1730764800000, 1.3e12]]}"#;
        let chart: MarketChartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(chart.prices.len(), 1);
        assert_eq!(chart.prices[0].timestamp_ms(), 1_730_764_800_000);
        assert_eq!(chart.market_caps[0].value(), 1.3e12);
    }

    #[test]
    fn history_without_market_data_yields_no_price() {
        let json = r#"{"market_data": null}"#;
        let history: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(history.usd_price(), None);
    }

    #[test]
    fn history_rejects_negative_price() {
        let json = r#"{"market_data": {"current_price": {"usd": -1.0}}}"#;
        let history: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(history.usd_price(), None);
    }
}

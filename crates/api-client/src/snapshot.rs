use crate::error::ApiError;
use crate::responses::MarketChartResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The persisted snapshot of raw API responses: a map from asset identifier
/// to its `{prices, market_caps}` payload, written once per run.
///
/// This is a durability/debugging aid, not required for the correctness of a
/// single run; it also allows re-running the pipeline offline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot(BTreeMap<String, MarketChartResponse>);

impl RawSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset_id: impl Into<String>, chart: MarketChartResponse) {
        self.0.insert(asset_id.into(), chart);
    }

    pub fn get(&self, asset_id: &str) -> Option<&MarketChartResponse> {
        self.0.get(asset_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MarketChartResponse)> {
        self.0.iter().map(|(id, chart)| (id.as_str(), chart))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Writes the snapshot as a self-contained JSON document, creating parent
    /// directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Snapshot(format!("{}: {}", path.display(), e)))?;
        }
        let json = serde_json::to_string(self)
            .map_err(|e| ApiError::Snapshot(format!("serialize: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| ApiError::Snapshot(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), assets = self.len(), "Raw-data snapshot written");
        Ok(())
    }

    /// Reads a snapshot previously written by `write_to`.
    pub fn load_from(path: &Path) -> Result<Self, ApiError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Snapshot(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&json).map_err(|e| ApiError::Snapshot(format!("parse: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::RawSample;

    #[test]
    fn snapshot_round_trips_through_disk() {
        let mut snapshot = RawSnapshot::new();
        snapshot.insert(
            "bitcoin",
            MarketChartResponse {
                prices: vec![RawSample::new(1_730_764_800_000, 68000.5)],
                market_caps: vec![RawSample::new(1_730_764_800_000, 1.3e12)],
            },
        );

        let path = std::env::temp_dir().join(format!("snapshot-test-{}.json", std::process::id()));
        snapshot.write_to(&path).unwrap();
        let loaded = RawSnapshot::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn loading_a_missing_file_is_a_snapshot_error() {
        let missing = Path::new("/nonexistent/snapshot.json");
        assert!(matches!(
            RawSnapshot::load_from(missing),
            Err(ApiError::Snapshot(_))
        ));
    }
}

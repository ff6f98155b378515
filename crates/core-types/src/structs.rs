use crate::error::CoreError;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single raw observation from the upstream API: a UTC millisecond
/// timestamp and the observed value (price or market cap, in USD).
///
/// Immutable once fetched. The upstream wire format is `[timestamp, value]`,
/// which is what the serde representation mirrors so snapshots round-trip
/// byte-compatible with the original API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample(pub i64, pub f64);

impl RawSample {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self(timestamp_ms, value)
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.0
    }

    pub fn value(&self) -> f64 {
        self.1
    }

    /// Derives the UTC calendar date this sample falls on.
    pub fn date(&self) -> Result<NaiveDate, CoreError> {
        DateTime::from_timestamp_millis(self.0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                CoreError::InvalidInput("timestamp_ms".to_string(), self.0.to_string())
            })
    }
}

/// The identity of one asset in the universe, stable for the lifetime of a
/// run. `id` is the API-stable key used to join series from different fetch
/// calls; `symbol` and `name` are display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIdentity {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// A grouping key over which performance windows are averaged.
///
/// Either a single asset ("BTC") or a composite such as "TOTAL3"
/// (market excluding BTC and ETH).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetClass(pub String);

impl AssetClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inclusive, contiguous range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::InvalidInput(
                "date_range".to_string(),
                format!("end {} precedes start {}", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    /// Iterates every date in the range, start and end inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A daily-indexed value series: an ordered mapping from calendar date to a
/// float value.
///
/// After alignment the covered range is contiguous (gaps carry the last known
/// value forward; leading gaps before the first observation are absent).
/// A `DailySeries` is never mutated after construction, only re-derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries(BTreeMap<NaiveDate, f64>);

impl DailySeries {
    /// An all-absent series: the declared "empty" terminal state returned by
    /// alignment when there were no usable samples. Callers must check for it.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_map(values: BTreeMap<NaiveDate, f64>) -> Self {
        Self(values)
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.0.get(&date).copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.0.iter().map(|(d, v)| (*d, *v))
    }

    /// The first `(date, value)` entry at or after `date`, if any.
    pub fn first_at_or_after(&self, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        self.0.range(date..).next().map(|(d, v)| (*d, *v))
    }
}

impl FromIterator<(NaiveDate, f64)> for DailySeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One rebased entry of a performance window: the day offset from the event
/// and the percent change since the event baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPoint {
    pub offset_days: u32,
    pub percent_change: f64,
}

/// The forward performance of one asset series relative to one event date,
/// rebased so offset 0 carries a percent change of exactly 0.0.
///
/// Invariants: strictly increasing offsets, length bounded by the configured
/// window length. Produced by the windower; absent entirely when the series
/// has no usable baseline for the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceWindow {
    pub event: NaiveDate,
    pub points: Vec<WindowPoint>,
}

impl PerformanceWindow {
    pub fn value_at(&self, offset_days: u32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.offset_days == offset_days)
            .map(|p| p.percent_change)
    }

    pub fn last_offset(&self) -> Option<u32> {
        self.points.last().map(|p| p.offset_days)
    }
}

/// One entry of an aggregated output curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub offset_days: u32,
    pub mean_percent_change: f64,
}

/// The terminal pipeline output for one asset class: the elementwise mean of
/// the contributing windows' percent changes, keyed by day offset.
///
/// An offset appears only if at least one contributing window has a value
/// there; missing offsets are never imputed as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedCurve {
    pub points: Vec<CurvePoint>,
}

impl AggregatedCurve {
    pub fn value_at(&self, offset_days: u32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.offset_days == offset_days)
            .map(|p| p.mean_percent_change)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::{DailySeries, DateRange, RawSample};
use std::collections::BTreeMap;

/// A stateless calculator that converts raw API samples into daily-indexed
/// series over an explicit date range.
///
/// Duplicate same-day samples are mean-aggregated; dates inside the range
/// with no direct observation carry the last known value forward; dates
/// before the first observation stay absent (no backward-fill).
#[derive(Debug, Default)]
pub struct SeriesAligner {}

impl SeriesAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aligns `samples` onto `range`.
    ///
    /// A sample observed at or before `range.start` (a lookback buffer
    /// collected before the range) anchors the forward-fill, so a start date
    /// that falls on a weekend or holiday still gets a value instead of an
    /// artificial gap. Empty input returns the declared empty series rather
    /// than an error; callers must check for it.
    pub fn align(&self, samples: &[RawSample], range: DateRange) -> DailySeries {
        if samples.is_empty() {
            return DailySeries::empty();
        }

        // 1. Group samples by UTC calendar date, averaging same-day values.
        let mut sums: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
        for sample in samples {
            let Ok(date) = sample.date() else {
                tracing::warn!(
                    timestamp_ms = sample.timestamp_ms(),
                    "Skipping sample with out-of-range timestamp"
                );
                continue;
            };
            let entry = sums.entry(date).or_insert((0.0, 0));
            entry.0 += sample.value();
            entry.1 += 1;
        }
        let daily: BTreeMap<NaiveDate, f64> = sums
            .into_iter()
            .map(|(date, (sum, count))| (date, sum / count as f64))
            .collect();

        // 2. Seed the carry with the latest observation at or before the
        //    range start, if one exists.
        let mut carried: Option<f64> = daily
            .range(..=range.start)
            .next_back()
            .map(|(_, value)| *value);

        // 3. Reindex onto the range with forward-fill; leading gaps stay absent.
        let mut aligned = BTreeMap::new();
        for date in range.days() {
            if let Some(value) = daily.get(&date) {
                carried = Some(*value);
            }
            if let Some(value) = carried {
                aligned.insert(date, value);
            }
        }
        DailySeries::from_map(aligned)
    }
}

/// The smallest range covering every sample's calendar date, across all the
/// per-asset sample sets of a run. Fails when there is nothing to cover.
pub fn covering_range<'a, I>(samples: I) -> Result<DateRange, AnalyticsError>
where
    I: IntoIterator<Item = &'a RawSample>,
{
    let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
    for sample in samples {
        let Ok(date) = sample.date() else { continue };
        bounds = Some(match bounds {
            None => (date, date),
            Some((start, end)) => (start.min(date), end.max(date)),
        });
    }
    let (start, end) =
        bounds.ok_or_else(|| AnalyticsError::InsufficientData("no samples to align".to_string()))?;
    DateRange::new(start, end)
        .map_err(|e| AnalyticsError::InsufficientData(e.to_string()))
}

/// Elementwise sum over the union of dates, treating a series with no value
/// on a date as contributing 0.0. Used to build the aggregate market cap.
pub fn aggregate_sum(series: &[DailySeries]) -> DailySeries {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for s in series {
        for (date, value) in s.iter() {
            *totals.entry(date).or_insert(0.0) += value;
        }
    }
    DailySeries::from_map(totals)
}

/// Elementwise `minuend - subtrahend` over the minuend's dates; a date absent
/// from the subtrahend subtracts 0.0. Used to carve majors out of the total.
pub fn subtract(minuend: &DailySeries, subtrahend: &DailySeries) -> DailySeries {
    minuend
        .iter()
        .map(|(date, value)| (date, value - subtrahend.value_on(date).unwrap_or(0.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn ms(d: u32) -> i64 {
        date(d).and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp_millis()
    }

    #[test]
    fn aligning_a_gap_free_daily_series_is_the_identity() {
        let samples = vec![
            RawSample::new(ms(1), 10.0),
            RawSample::new(ms(2), 11.0),
            RawSample::new(ms(3), 12.0),
        ];
        let range = DateRange::new(date(1), date(3)).unwrap();
        let aligned = SeriesAligner::new().align(&samples, range);

        let expected: DailySeries =
            [(date(1), 10.0), (date(2), 11.0), (date(3), 12.0)].into_iter().collect();
        assert_eq!(aligned, expected);
    }

    #[test]
    fn missing_day_takes_the_prior_days_value_exactly() {
        let samples = vec![RawSample::new(ms(1), 10.0), RawSample::new(ms(3), 12.0)];
        let range = DateRange::new(date(1), date(3)).unwrap();
        let aligned = SeriesAligner::new().align(&samples, range);

        assert_eq!(aligned.value_on(date(2)), Some(10.0));
        assert_eq!(aligned.value_on(date(3)), Some(12.0));
    }

    #[test]
    fn same_day_samples_are_mean_aggregated() {
        let base = date(1).and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis();
        let samples = vec![
            RawSample::new(base, 10.0),
            RawSample::new(base + 3_600_000, 20.0),
        ];
        let range = DateRange::new(date(1), date(1)).unwrap();
        let aligned = SeriesAligner::new().align(&samples, range);

        assert_eq!(aligned.value_on(date(1)), Some(15.0));
    }

    #[test]
    fn leading_gap_stays_absent_without_a_buffer_sample() {
        let samples = vec![RawSample::new(ms(3), 12.0)];
        let range = DateRange::new(date(1), date(4)).unwrap();
        let aligned = SeriesAligner::new().align(&samples, range);

        assert_eq!(aligned.value_on(date(1)), None);
        assert_eq!(aligned.value_on(date(2)), None);
        assert_eq!(aligned.value_on(date(3)), Some(12.0));
        assert_eq!(aligned.value_on(date(4)), Some(12.0));
    }

    #[test]
    fn buffer_sample_before_the_range_anchors_a_missing_start_date() {
        // A Friday close carried over a weekend start date.
        let samples = vec![RawSample::new(ms(3), 12.0), RawSample::new(ms(7), 14.0)];
        let range = DateRange::new(date(5), date(7)).unwrap();
        let aligned = SeriesAligner::new().align(&samples, range);

        assert_eq!(aligned.value_on(date(5)), Some(12.0));
        assert_eq!(aligned.value_on(date(6)), Some(12.0));
        assert_eq!(aligned.value_on(date(7)), Some(14.0));
    }

    #[test]
    fn empty_input_returns_the_empty_series() {
        let range = DateRange::new(date(1), date(3)).unwrap();
        let aligned = SeriesAligner::new().align(&[], range);
        assert!(aligned.is_empty());
    }

    #[test]
    fn covering_range_spans_all_sample_dates() {
        let a = vec![RawSample::new(ms(3), 1.0)];
        let b = vec![RawSample::new(ms(1), 1.0), RawSample::new(ms(9), 1.0)];
        let range = covering_range(a.iter().chain(b.iter())).unwrap();
        assert_eq!(range, DateRange::new(date(1), date(9)).unwrap());
    }

    #[test]
    fn covering_range_of_nothing_is_insufficient_data() {
        assert!(covering_range([].iter()).is_err());
    }

    #[test]
    fn aggregate_sum_treats_absent_dates_as_zero() {
        let a: DailySeries = [(date(1), 1.0), (date(2), 2.0)].into_iter().collect();
        let b: DailySeries = [(date(2), 10.0)].into_iter().collect();
        let total = aggregate_sum(&[a, b]);

        assert_eq!(total.value_on(date(1)), Some(1.0));
        assert_eq!(total.value_on(date(2)), Some(12.0));
    }

    #[test]
    fn subtract_ignores_dates_missing_from_the_subtrahend() {
        let total: DailySeries = [(date(1), 10.0), (date(2), 10.0)].into_iter().collect();
        let major: DailySeries = [(date(2), 4.0)].into_iter().collect();
        let rest = subtract(&total, &major);

        assert_eq!(rest.value_on(date(1)), Some(10.0));
        assert_eq!(rest.value_on(date(2)), Some(6.0));
    }
}

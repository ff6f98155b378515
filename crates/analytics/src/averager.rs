use core_types::{AggregatedCurve, AssetClass, CurvePoint, PerformanceWindow};
use std::collections::BTreeMap;

/// Aligns per-event windows positionally (by day offset) and computes the
/// elementwise mean across events, per asset class.
#[derive(Debug, Default)]
pub struct CrossEventAverager {}

impl CrossEventAverager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Averages `windows`, each already tagged with its asset class (the
    /// grouping key applied by the caller).
    ///
    /// For each offset present in at least one window of a group, the output
    /// value is the mean over exactly the windows holding that offset; an
    /// offset no window holds is omitted, never imputed as zero. A class
    /// with zero windows does not appear in the result at all; callers must
    /// treat a missing class as "insufficient data", not as a zero curve.
    pub fn average<'a, I>(&self, windows: I) -> BTreeMap<AssetClass, AggregatedCurve>
    where
        I: IntoIterator<Item = (AssetClass, &'a PerformanceWindow)>,
    {
        let mut groups: BTreeMap<AssetClass, BTreeMap<u32, (f64, u32)>> = BTreeMap::new();
        for (class, window) in windows {
            let offsets = groups.entry(class).or_default();
            for point in &window.points {
                let entry = offsets.entry(point.offset_days).or_insert((0.0, 0));
                entry.0 += point.percent_change;
                entry.1 += 1;
            }
        }

        groups
            .into_iter()
            .map(|(class, offsets)| {
                let points = offsets
                    .into_iter()
                    .map(|(offset_days, (sum, count))| CurvePoint {
                        offset_days,
                        mean_percent_change: sum / count as f64,
                    })
                    .collect();
                (class, AggregatedCurve { points })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::WindowPoint;

    fn window(event_day: u32, points: &[(u32, f64)]) -> PerformanceWindow {
        PerformanceWindow {
            event: NaiveDate::from_ymd_opt(2025, 6, event_day).unwrap(),
            points: points
                .iter()
                .map(|&(offset_days, percent_change)| WindowPoint {
                    offset_days,
                    percent_change,
                })
                .collect(),
        }
    }

    fn btc() -> AssetClass {
        AssetClass::new("BTC")
    }

    #[test]
    fn offsets_average_over_only_the_windows_that_hold_them() {
        // 5 windows; only 2 reach offset 50.
        let windows = vec![
            window(1, &[(0, 0.0), (50, 10.0)]),
            window(2, &[(0, 0.0), (50, 30.0)]),
            window(3, &[(0, 0.0)]),
            window(4, &[(0, 0.0)]),
            window(5, &[(0, 0.0)]),
        ];
        let tagged = windows.iter().map(|w| (btc(), w));
        let curves = CrossEventAverager::new().average(tagged);

        let curve = &curves[&btc()];
        // Mean of exactly the 2 contributors, not of 5.
        assert_eq!(curve.value_at(50), Some(20.0));
        assert_eq!(curve.value_at(0), Some(0.0));
    }

    #[test]
    fn classes_are_grouped_independently() {
        let btc_window = window(1, &[(0, 0.0), (1, 5.0)]);
        let eth_window = window(1, &[(0, 0.0), (1, -3.0)]);
        let curves = CrossEventAverager::new().average(vec![
            (AssetClass::new("BTC"), &btc_window),
            (AssetClass::new("ETH"), &eth_window),
        ]);

        assert_eq!(curves[&AssetClass::new("BTC")].value_at(1), Some(5.0));
        assert_eq!(curves[&AssetClass::new("ETH")].value_at(1), Some(-3.0));
    }

    #[test]
    fn a_class_with_no_windows_is_absent_from_the_result() {
        let curves = CrossEventAverager::new().average(std::iter::empty());
        assert!(curves.is_empty());
    }

    #[test]
    fn curve_offsets_are_sorted_ascending() {
        let w = window(1, &[(0, 0.0), (2, 4.0), (1, 2.0)]);
        let curves = CrossEventAverager::new().average(vec![(btc(), &w)]);
        let offsets: Vec<u32> = curves[&btc()].points.iter().map(|p| p.offset_days).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
    }
}

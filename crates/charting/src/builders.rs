//! Builders translating aggregated analytics output into chart artifacts.

use crate::chart::{Axis, Chart, LineStyle, TraceSeries, XValue};
use crate::format::{format_market_cap, format_price};
use chrono::{Days, NaiveDate};
use core_types::{AggregatedCurve, AssetClass};
use std::collections::BTreeMap;

/// Fixed colors for the market-drop comparison traces.
fn drawdown_color(class: &AssetClass) -> &'static str {
    match class.as_str() {
        "BTC" => "#F7931A",
        "ETH" => "#8E44AD",
        "TOTAL3" => "#2980B9",
        _ => "#7F8C8D",
    }
}

/// Fixed colors for the traditional-asset traces on the anchor chart.
fn traditional_color(name: &str) -> &'static str {
    match name {
        "S&P 500" => "#2E86C1",
        "Nasdaq 100" => "#2874A6",
        "Gold" => "#F1C40F",
        _ => "#7F8C8D",
    }
}

/// Rotating palette for crypto traces on the anchor chart.
const CRYPTO_PALETTE: [&str; 10] = [
    "#E74C3C", "#27AE60", "#8E44AD", "#F39C12", "#16A085", "#D35400", "#2980B9", "#C0392B",
    "#1ABC9C", "#7D3C98",
];

/// Builds the post-drawdown comparison chart: one averaged curve per asset
/// class, plotted against the day offset from the event.
pub fn drawdown_chart(title: &str, curves: &BTreeMap<AssetClass, AggregatedCurve>) -> Chart {
    let traces = curves
        .iter()
        .map(|(class, curve)| TraceSeries {
            name: class.as_str().to_string(),
            style: LineStyle::solid(drawdown_color(class)),
            points: curve
                .points
                .iter()
                .map(|p| (XValue::Day(p.offset_days), p.mean_percent_change))
                .collect(),
            labels: Vec::new(),
        })
        .collect();

    Chart {
        title: title.to_string(),
        x_axis: Axis::linear("Days After Drop"),
        y_axis: Axis::linear("Percentage Change (%)"),
        zero_line: true,
        traces,
    }
}

/// Builds the anchor-date chart: every curve starts at 0% on the anchor, and
/// offsets are mapped back onto calendar dates for the x-axis.
///
/// Traditional assets keep their fixed colors; crypto assets cycle through
/// the palette in the order given.
pub fn anchor_chart(
    title: &str,
    anchor: NaiveDate,
    traditional: &[(String, AggregatedCurve)],
    crypto: &[(String, AggregatedCurve)],
) -> Chart {
    let date_points = |curve: &AggregatedCurve| -> Vec<(XValue, f64)> {
        curve
            .points
            .iter()
            .filter_map(|p| {
                anchor
                    .checked_add_days(Days::new(p.offset_days as u64))
                    .map(|date| (XValue::Date(date), p.mean_percent_change))
            })
            .collect()
    };

    let mut traces: Vec<TraceSeries> = traditional
        .iter()
        .map(|(name, curve)| TraceSeries {
            name: name.clone(),
            style: LineStyle::solid(traditional_color(name)),
            points: date_points(curve),
            labels: Vec::new(),
        })
        .collect();

    traces.extend(crypto.iter().enumerate().map(|(i, (name, curve))| {
        TraceSeries {
            name: name.clone(),
            style: LineStyle::solid(CRYPTO_PALETTE[i % CRYPTO_PALETTE.len()]),
            points: date_points(curve),
            labels: Vec::new(),
        }
    }));

    Chart {
        title: title.to_string(),
        x_axis: Axis::linear("Date"),
        y_axis: Axis::linear("Percentage Change (%)"),
        zero_line: true,
        traces,
    }
}

/// One asset on the snapshot scatter: its change since the snapshot date and
/// its current standing.
#[derive(Debug, Clone)]
pub struct ScatterEntry {
    pub name: String,
    pub symbol: String,
    pub percent_change: f64,
    pub market_cap: f64,
    pub current_price: f64,
}

impl ScatterEntry {
    fn label(&self) -> String {
        format!(
            "{} ({}): {:+.2}% at {} / cap {}",
            self.name,
            self.symbol.to_uppercase(),
            self.percent_change,
            format_price(self.current_price),
            format_market_cap(self.market_cap),
        )
    }
}

/// Builds the snapshot scatter: percent change since the snapshot date
/// against market cap on a log axis, decliners in red and advancers in blue.
pub fn snapshot_scatter(title: &str, entries: &[ScatterEntry]) -> Chart {
    let trace = |name: &str, color: &str, selected: Vec<&ScatterEntry>| TraceSeries {
        name: name.to_string(),
        style: LineStyle::solid(color).with_markers(),
        points: selected
            .iter()
            .map(|e| (XValue::Value(e.market_cap), e.percent_change))
            .collect(),
        labels: selected.iter().map(|e| e.label()).collect(),
    };

    let decliners: Vec<&ScatterEntry> = entries.iter().filter(|e| e.percent_change < 0.0).collect();
    let advancers: Vec<&ScatterEntry> =
        entries.iter().filter(|e| e.percent_change >= 0.0).collect();

    Chart {
        title: title.to_string(),
        x_axis: Axis::log("Market Cap (USD)"),
        y_axis: Axis::linear("Percentage Change (%)"),
        zero_line: true,
        traces: vec![
            trace("Decliners", "#E74C3C", decliners),
            trace("Advancers", "#2E86C1", advancers),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::CurvePoint;

    fn curve(points: &[(u32, f64)]) -> AggregatedCurve {
        AggregatedCurve {
            points: points
                .iter()
                .map(|&(offset_days, mean_percent_change)| CurvePoint {
                    offset_days,
                    mean_percent_change,
                })
                .collect(),
        }
    }

    #[test]
    fn drawdown_chart_keeps_the_fixed_class_colors() {
        let mut curves = BTreeMap::new();
        curves.insert(AssetClass::new("BTC"), curve(&[(0, 0.0), (1, 2.0)]));
        curves.insert(AssetClass::new("TOTAL3"), curve(&[(0, 0.0)]));

        let chart = drawdown_chart("drops", &curves);
        assert_eq!(chart.traces.len(), 2);
        let btc = chart.traces.iter().find(|t| t.name == "BTC").unwrap();
        assert_eq!(btc.style.color, "#F7931A");
        assert_eq!(btc.points[1], (XValue::Day(1), 2.0));
        assert!(chart.zero_line);
    }

    #[test]
    fn anchor_chart_maps_offsets_onto_calendar_dates() {
        let anchor = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        let traditional = vec![("Gold".to_string(), curve(&[(0, 0.0), (3, 1.5)]))];
        let crypto = vec![("BTC".to_string(), curve(&[(0, 0.0)]))];

        let chart = anchor_chart("anchor", anchor, &traditional, &crypto);
        let gold = &chart.traces[0];
        assert_eq!(gold.style.color, "#F1C40F");
        assert_eq!(
            gold.points[1],
            (
                XValue::Date(NaiveDate::from_ymd_opt(2025, 4, 5).unwrap()),
                1.5
            )
        );
        // Crypto traces follow the traditional ones and take palette colors.
        assert_eq!(chart.traces[1].name, "BTC");
        assert_eq!(chart.traces[1].style.color, CRYPTO_PALETTE[0]);
    }

    #[test]
    fn crypto_palette_wraps_around() {
        let anchor = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        let crypto: Vec<(String, AggregatedCurve)> = (0..12)
            .map(|i| (format!("C{i}"), curve(&[(0, 0.0)])))
            .collect();
        let chart = anchor_chart("anchor", anchor, &[], &crypto);
        assert_eq!(chart.traces[10].style.color, CRYPTO_PALETTE[0]);
        assert_eq!(chart.traces[11].style.color, CRYPTO_PALETTE[1]);
    }

    #[test]
    fn scatter_splits_decliners_from_advancers() {
        let entries = vec![
            ScatterEntry {
                name: "Bitcoin".to_string(),
                symbol: "btc".to_string(),
                percent_change: 12.5,
                market_cap: 1.2e12,
                current_price: 64000.0,
            },
            ScatterEntry {
                name: "Dogecoin".to_string(),
                symbol: "doge".to_string(),
                percent_change: -4.0,
                market_cap: 2.0e10,
                current_price: 0.12,
            },
            ScatterEntry {
                name: "Flat".to_string(),
                symbol: "flt".to_string(),
                percent_change: 0.0,
                market_cap: 1.0e9,
                current_price: 1.0,
            },
        ];
        let chart = snapshot_scatter("scatter", &entries);

        let decliners = &chart.traces[0];
        let advancers = &chart.traces[1];
        assert_eq!(decliners.points.len(), 1);
        // Zero change counts as an advancer, not a decliner.
        assert_eq!(advancers.points.len(), 2);
        assert!(chart.x_axis.log_scale);
        assert_eq!(decliners.labels.len(), 1);
        assert!(decliners.labels[0].contains("DOGE"));
        assert!(decliners.labels[0].contains("$20.00B"));
    }
}

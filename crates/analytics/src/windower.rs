use chrono::{Days, NaiveDate};
use core_types::{DailySeries, PerformanceWindow, WindowPoint};

/// Extracts the fixed-length forward window of one asset series relative to
/// one event date, rebased to "percent change since the event".
#[derive(Debug, Clone, Copy)]
pub struct PerformanceWindower {
    length_days: u32,
    require_full_length: bool,
}

impl PerformanceWindower {
    pub fn new(length_days: u32) -> Self {
        Self {
            length_days,
            require_full_length: false,
        }
    }

    /// Discard windows whose final offset would run past the end of the
    /// available data, instead of emitting a shorter window. The drawdown
    /// pipeline averages only complete windows; the anchor pipeline keeps
    /// whatever has accrued since the anchor date.
    pub fn require_full_length(mut self) -> Self {
        self.require_full_length = true;
        self
    }

    /// The window for `series` relative to `event`, or `None` when the series
    /// has no usable baseline (no value anywhere at or after the event) or a
    /// full-length window was required and the data ends too early.
    ///
    /// The baseline is the value at the event itself; for an asset that
    /// begins trading after the event, the first later value stands in as a
    /// synthetic baseline dated at the event. Identical inputs always produce
    /// an identical window.
    pub fn window(&self, series: &DailySeries, event: NaiveDate) -> Option<PerformanceWindow> {
        if self.length_days == 0 {
            return None;
        }

        let baseline = match series.value_on(event) {
            Some(value) => value,
            None => series.first_at_or_after(event)?.1,
        };
        if baseline == 0.0 {
            // A zero baseline admits no percent-change rebasing.
            return None;
        }

        if self.require_full_length {
            let final_date = event.checked_add_days(Days::new(self.length_days as u64 - 1))?;
            if series.last_date()? < final_date {
                return None;
            }
        }

        // Offset 0 is the baseline itself: exactly 0.0 by construction.
        let mut points = vec![WindowPoint {
            offset_days: 0,
            percent_change: 0.0,
        }];
        for offset in 1..self.length_days {
            let Some(date) = event.checked_add_days(Days::new(offset as u64)) else {
                break;
            };
            if let Some(value) = series.value_on(date) {
                points.push(WindowPoint {
                    offset_days: offset,
                    percent_change: (value / baseline - 1.0) * 100.0,
                });
            }
        }

        Some(PerformanceWindow { event, points })
    }
}

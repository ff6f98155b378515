use chrono::{Days, NaiveDate};
use core_types::DailySeries;

/// The strategy that turns an aggregate series into a set of event dates.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetector {
    /// Rolling-window percentage-change threshold crossing: every date whose
    /// change versus `lookback_days` earlier is at or below
    /// `-threshold_fraction` is an event.
    ///
    /// Consecutive qualifying days are NOT merged: each day of a sustained
    /// drawdown is an independent event, weighed equally by the averager.
    Drawdown {
        lookback_days: u32,
        threshold_fraction: f64,
    },
    /// A single externally designated calendar date; no detection logic.
    Anchor { date: NaiveDate },
}

impl EventDetector {
    /// Produces the event dates for `aggregate` (e.g., total market cap).
    /// The anchor variant ignores the series and yields its date verbatim.
    pub fn detect(&self, aggregate: &DailySeries) -> Vec<NaiveDate> {
        match self {
            Self::Drawdown {
                lookback_days,
                threshold_fraction,
            } => {
                let mut events = Vec::new();
                for (date, value) in aggregate.iter() {
                    let Some(prior_date) = date.checked_sub_days(Days::new(*lookback_days as u64))
                    else {
                        continue;
                    };
                    let Some(prior) = aggregate.value_on(prior_date) else {
                        continue;
                    };
                    if prior == 0.0 {
                        continue;
                    }
                    let change = (value - prior) / prior;
                    if change <= -threshold_fraction {
                        events.push(date);
                    }
                }
                tracing::info!(events = events.len(), "Drawdown detection complete");
                events
            }
            Self::Anchor { date } => vec![*date],
        }
    }
}

//! Display formatting of a trace's statistics
//!
//! Everything here is a pure function of a [`Trace`] snapshot.

use crate::Trace;
use chrono::{DateTime, Local, TimeZone, Utc};

/// Placeholder shown for values that are not available
pub const PLACEHOLDER: &str = "--";

/// Formatted statistics of one trace, ready to be put into labels
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceSummary {
    pub distance: String,
    pub average_speed: String,
    pub maximum_speed: String,
    pub duration: String,
    pub logging_date: String,
    pub logging_time: String,
}

impl TraceSummary {
    /// Format `trace` with timestamps shown in the local time zone
    pub fn local(trace: &Trace) -> Self {
        Self::new_in(trace, &Local)
    }

    /// Format `trace` with timestamps shown in `tz`
    pub fn new_in<Tz: TimeZone>(trace: &Trace, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let start = trace.start_time();
        let end = trace.end_time();
        Self {
            distance: format_distance(trace.distance()),
            average_speed: format_speed(trace.average_speed()),
            maximum_speed: format_speed(trace.maximum_speed()),
            duration: format_duration(trace.duration()),
            logging_date: start
                .map(|t| format_in(t, tz, "%x"))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            logging_time: format!(
                "{} - {}",
                start
                    .map(|t| format_in(t, tz, "%X"))
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                end.map(|t| format_in(t, tz, "%X"))
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            ),
        }
    }

    /// Summary with every field set to the placeholder
    pub fn empty() -> Self {
        Self {
            distance: PLACEHOLDER.to_string(),
            average_speed: PLACEHOLDER.to_string(),
            maximum_speed: PLACEHOLDER.to_string(),
            duration: PLACEHOLDER.to_string(),
            logging_date: PLACEHOLDER.to_string(),
            logging_time: PLACEHOLDER.to_string(),
        }
    }
}

impl Default for TraceSummary {
    fn default() -> Self {
        Self::empty()
    }
}

fn format_in<Tz: TimeZone>(time: DateTime<Utc>, tz: &Tz, fmt: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.with_timezone(tz).format(fmt).to_string()
}

/// Distance in kilometers with two decimals, e.g. `12.35 km`
pub fn format_distance(meters: f64) -> String {
    format!("{:.2} km", meters / 1000.0)
}

/// Speed in meters per second with two decimals
pub fn format_speed(meters_per_second: f64) -> String {
    format!("{:.2} m/s", meters_per_second)
}

/// Duration split into whole minutes and remaining seconds
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{} minutes, {} seconds", total / 60, total % 60)
}

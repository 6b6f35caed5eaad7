// SPDX-License-Identifier: MIT

//! Shared helpers for date/time handling.

use chrono::{DateTime, Datelike, Days, NaiveDate, SecondsFormat, Utc, Weekday};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Start of the calendar week containing `date`, where weeks begin on
/// `week_starts_on`.
pub fn week_start_containing(date: NaiveDate, week_starts_on: Weekday) -> NaiveDate {
    let days_back = (7 + date.weekday().num_days_from_monday()
        - week_starts_on.num_days_from_monday())
        % 7;
    date - Days::new(u64::from(days_back))
}

/// Number of distinct calendar weeks intersecting `[start, end]`.
pub fn weeks_in_window(start: NaiveDate, end: NaiveDate, week_starts_on: Weekday) -> u32 {
    if end < start {
        return 0;
    }
    let first = week_start_containing(start, week_starts_on);
    let last = week_start_containing(end, week_starts_on);
    ((last - first).num_days() / 7 + 1) as u32
}

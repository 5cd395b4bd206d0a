//! Calendar-month helpers shared by [crate::datafile] and [crate::store].
//!
//! The store treats the calendar library as a primitive (spec.md §1):
//! all it needs is "first instant of this month" and "first instant of
//! next month", both of which `chrono` gives us directly.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// First instant, in UTC, of the month containing `t`.
pub fn month_start(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc.ymd(t.year(), t.month(), 1).and_hms(0, 0, 0)
}

/// First instant, in UTC, of the month following the one containing `t`.
pub fn next_month_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    Utc.ymd(year, month, 1).and_hms(0, 0, 0)
}

/// Render `t`'s month as the `YYYY-MM` stem used in datafile names.
pub fn month_stem(t: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", t.year(), t.month())
}

/// Parse a `YYYY-MM` stem back into the first instant of that month.
/// Returns `None` if the stem isn't well formed.
pub fn parse_month_stem(stem: &str) -> Option<DateTime<Utc>> {
    let mut parts = stem.splitn(2, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) || parts.next().is_some() {
        return None;
    }
    Some(Utc.ymd(year, month, 1).and_hms(0, 0, 0))
}

#[cfg(test)]
#[path = "util_test.rs"]
mod util_test;

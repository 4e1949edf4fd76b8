//! Day and week arithmetic used by the quest progress logic.
//!
//! "Same day" and "same week" are the two equality units the check-in
//! algorithm cares about. Days are keyed in UTC; weeks are ISO weeks
//! anchored on Monday.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

/// Canonical day key for a timestamp: the UTC calendar date.
pub fn day_key(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// The Monday at or before `day`.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    let back = day.weekday().num_days_from_monday() as u64;
    // num_days_from_monday is at most 6, so this cannot underflow the
    // calendar range for any date chrono can represent.
    day.checked_sub_days(Days::new(back)).unwrap_or(day)
}

/// Two days fall in the same week iff they share a Monday anchor.
pub fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    start_of_week(a) == start_of_week(b)
}
